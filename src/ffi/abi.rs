#[unsafe(no_mangle)]
/// ### English
/// Returns the C ABI version.
///
/// ### 中文
/// 返回 C ABI 版本号。
pub extern "C" fn xian_frame_relay_abi_version() -> u32 {
    super::XIAN_FRAME_RELAY_ABI_VERSION
}
