//! SARA-R5 command sequences used by the update flow.

use core::fmt::Write as _;

use heapless::String;
use log::warn;

use super::super::{
    at::{
        file_list_contains, parse_http_error, parse_operator_registered, parse_pdp_active,
        AtResult, AtTransport,
    },
    config::{
        UpdateServer, AT_COMMAND_MAX, AT_DEFAULT_TIMEOUT_MS, AT_HTTP_SETUP_TIMEOUT_MS,
        AT_PROBE_TIMEOUT_MS, NCP_FW_INSTALL_BAUD, NCP_FW_UPDATE_FOAT_TAG,
        NCP_FW_UPDATE_HTTP_PROFILE,
    },
};
use super::version::parse_firmware_version;

type Command = String<AT_COMMAND_MAX>;

fn format_command(args: core::fmt::Arguments<'_>) -> Option<Command> {
    let mut cmd = Command::new();
    cmd.write_fmt(args).ok()?;
    Some(cmd)
}

fn run(at: &mut impl AtTransport, cmd: &str, timeout_ms: u32) -> AtResult {
    at.command(cmd, timeout_ms, &mut |_| {})
}

fn run_formatted(
    at: &mut impl AtTransport,
    args: core::fmt::Arguments<'_>,
    timeout_ms: u32,
) -> AtResult {
    match format_command(args) {
        Some(cmd) => run(at, &cmd, timeout_ms),
        None => AtResult::Error,
    }
}

pub(crate) fn probe(at: &mut impl AtTransport) -> AtResult {
    run(at, "AT", AT_PROBE_TIMEOUT_MS)
}

/// Packed `ATI9` version, 0 when the reply is missing or unparsable.
pub(crate) fn read_firmware_version(at: &mut impl AtTransport) -> u32 {
    let mut version = 0;
    let result = at.command("ATI9", AT_DEFAULT_TIMEOUT_MS, &mut |line| {
        if version == 0 {
            version = parse_firmware_version(line);
        }
    });
    if result.is_ok() {
        version
    } else {
        0
    }
}

pub(crate) fn file_exists(at: &mut impl AtTransport, filename: &str) -> bool {
    let Some(cmd) = format_command(format_args!("AT+ULSTFILE=0,\"{}\"", NCP_FW_UPDATE_FOAT_TAG))
    else {
        return false;
    };
    let mut found = false;
    let result = at.command(&cmd, AT_DEFAULT_TIMEOUT_MS, &mut |line| {
        found |= file_list_contains(line, filename);
    });
    result.is_ok() && found
}

pub(crate) fn delete_file(at: &mut impl AtTransport, filename: &str) -> AtResult {
    run_formatted(
        at,
        format_args!("AT+UDELFILE=\"{}\",\"{}\"", filename, NCP_FW_UPDATE_FOAT_TAG),
        AT_DEFAULT_TIMEOUT_MS,
    )
}

/// Resets the HTTP profile and points it at `server` over TLS.
pub(crate) fn setup_https(at: &mut impl AtTransport, server: &UpdateServer) -> AtResult {
    let profile = NCP_FW_UPDATE_HTTP_PROFILE;
    let steps = [
        format_command(format_args!("AT+USECPRF={},0,0", server.security_profile)),
        format_command(format_args!("AT+UHTTP={}", profile)),
        format_command(format_args!("AT+UHTTP={},1,\"{}\"", profile, server.host)),
        format_command(format_args!("AT+UHTTP={},5,{}", profile, server.port)),
        format_command(format_args!(
            "AT+UHTTP={},6,1,{}",
            profile, server.security_profile
        )),
    ];
    for step in steps {
        let Some(cmd) = step else {
            return AtResult::Error;
        };
        let result = run(at, &cmd, AT_HTTP_SETUP_TIMEOUT_MS);
        if !result.is_ok() {
            warn!("ncp_fw: https setup step failed cmd={} result={}", cmd, result.as_str());
            return result;
        }
    }
    AtResult::Ok
}

/// Starts a GET whose body is stored as a FOAT image; completion arrives
/// as `+UUHTTPCR`.
pub(crate) fn start_download(at: &mut impl AtTransport, filename: &str) -> AtResult {
    run_formatted(
        at,
        format_args!(
            "AT+UHTTPC={},100,\"/{}\"",
            NCP_FW_UPDATE_HTTP_PROFILE, filename
        ),
        AT_HTTP_SETUP_TIMEOUT_MS,
    )
}

pub(crate) fn http_error(at: &mut impl AtTransport) -> Option<(u16, u16)> {
    let mut error = None;
    let cmd = format_command(format_args!("AT+UHTTPER={}", NCP_FW_UPDATE_HTTP_PROFILE))?;
    let result = at.command(&cmd, AT_DEFAULT_TIMEOUT_MS, &mut |line| {
        if error.is_none() {
            error = parse_http_error(line);
        }
    });
    if result.is_ok() {
        error
    } else {
        None
    }
}

pub(crate) fn is_registered(at: &mut impl AtTransport) -> bool {
    let mut registered = false;
    let result = at.command("AT+COPS?", AT_DEFAULT_TIMEOUT_MS, &mut |line| {
        registered |= parse_operator_registered(line).unwrap_or(false);
    });
    result.is_ok() && registered
}

pub(crate) fn pdp_active(at: &mut impl AtTransport, profile: u8) -> bool {
    let Some(cmd) = format_command(format_args!("AT+UPSND={},8", profile)) else {
        return false;
    };
    let mut active = false;
    let result = at.command(&cmd, AT_DEFAULT_TIMEOUT_MS, &mut |line| {
        active |= parse_pdp_active(line, profile).unwrap_or(false);
    });
    result.is_ok() && active
}

/// Maps the packet-switched profile onto `cid` and activates it.
pub(crate) fn activate_pdp(at: &mut impl AtTransport, profile: u8, cid: u8) -> AtResult {
    let result = run_formatted(
        at,
        format_args!("AT+UPSD={},100,{}", profile, cid),
        AT_DEFAULT_TIMEOUT_MS,
    );
    if !result.is_ok() {
        return result;
    }
    run_formatted(
        at,
        format_args!("AT+UPSDA={},3", profile),
        AT_HTTP_SETUP_TIMEOUT_MS,
    )
}

pub(crate) fn start_install(at: &mut impl AtTransport) -> AtResult {
    run_formatted(
        at,
        format_args!("AT+UFWINSTALL=1,{}", NCP_FW_INSTALL_BAUD),
        AT_HTTP_SETUP_TIMEOUT_MS,
    )
}
