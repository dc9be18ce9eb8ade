use super::super::{at::parse_u32, config::NCP_FW_ENG_VERSION_OFFSET};

const ENG_MARKER: &str = "_ENG";

/// Packs an `ATI9` reply such as `02.06,A00.01` into one orderable key:
/// `major1*1_000_000 + minor1*10_000 + major2*100 + minor2`, plus
/// `NCP_FW_ENG_VERSION_OFFSET` for engineering builds. Returns 0 when the
/// text is not a version.
pub fn parse_firmware_version(text: &str) -> u32 {
    try_parse(text.trim()).unwrap_or(0)
}

fn try_parse(text: &str) -> Option<u32> {
    let (firmware, application) = text.split_once(',')?;
    let (firmware, engineering) = match firmware.find(ENG_MARKER) {
        Some(at) => (&firmware[..at], true),
        None => (firmware, false),
    };
    let (major1, minor1) = parse_pair(firmware)?;
    let (major2, minor2) = parse_pair(application.trim().strip_prefix('A')?)?;
    let mut version = major1 * 1_000_000 + minor1 * 10_000 + major2 * 100 + minor2;
    if engineering {
        version += NCP_FW_ENG_VERSION_OFFSET;
    }
    Some(version)
}

fn parse_pair(text: &str) -> Option<(u32, u32)> {
    let (major, minor) = text.trim().split_once('.')?;
    let major = parse_u32(major)?;
    let minor = parse_u32(minor)?;
    if major > 99 || minor > 99 {
        return None;
    }
    Some((major, minor))
}
