use heapless::String;

use super::super::{system::AtResult, types::NCP_FW_MD5_LEN};

pub const URC_HTTP_COMPLETE: &str = "+UUHTTPCR:";
pub const URC_PDP_EVENT: &str = "+CGEV:";
pub const URC_FW_INSTALL: &str = "+UUFWINSTALL:";

/// Last HTTP completion reported by the modem.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HttpsResponse {
    pub command: u16,
    pub result: u8,
    pub status_code: u16,
    pub md5_sum: String<NCP_FW_MD5_LEN>,
}

pub fn final_result(line: &str) -> Option<AtResult> {
    match line {
        "OK" => Some(AtResult::Ok),
        "ERROR" | "NO CARRIER" | "ABORTED" => Some(AtResult::Error),
        _ if line.starts_with("+CME ERROR") || line.starts_with("+CMS ERROR") => {
            Some(AtResult::Error)
        }
        _ => None,
    }
}

pub fn is_urc(line: &str) -> bool {
    line.starts_with(URC_HTTP_COMPLETE)
        || line.starts_with(URC_PDP_EVENT)
        || line.starts_with(URC_FW_INSTALL)
}

/// `+UUHTTPCR: <profile>,<command>,<result>[,<status>,"<md5>"]`
pub fn parse_http_complete(line: &str) -> Option<HttpsResponse> {
    let mut fields = fields_after(line, URC_HTTP_COMPLETE)?;
    let _profile = parse_u32(fields.next()?)?;
    let command = u16::try_from(parse_u32(fields.next()?)?).ok()?;
    let result = u8::try_from(parse_u32(fields.next()?)?).ok()?;
    let mut response = HttpsResponse {
        command,
        result,
        ..HttpsResponse::default()
    };
    if let Some(status) = fields.next() {
        response.status_code = u16::try_from(parse_u32(status)?).ok()?;
    }
    if let Some(md5) = fields.next() {
        response.md5_sum.push_str(unquote(md5)).ok()?;
    }
    Some(response)
}

/// `+CGEV: ME PDN DEACT <cid>`, `NW PDN DEACT <cid>[,..]` and the legacy
/// `ME DEACT <type>,<addr>,<cid>` form.
pub fn parse_pdp_deactivation(line: &str) -> Option<u8> {
    let rest = line.strip_prefix(URC_PDP_EVENT)?.trim();
    let cid = if let Some(args) = rest
        .strip_prefix("ME PDN DEACT")
        .or_else(|| rest.strip_prefix("NW PDN DEACT"))
    {
        args.split(',').next()?
    } else {
        rest.strip_prefix("ME DEACT")
            .or_else(|| rest.strip_prefix("NW DEACT"))?
            .split(',')
            .next_back()?
    };
    u8::try_from(parse_u32(cid.trim())?).ok()
}

/// `+UUFWINSTALL: <progress>`
pub fn parse_install_progress(line: &str) -> Option<u8> {
    let mut fields = fields_after(line, URC_FW_INSTALL)?;
    u8::try_from(parse_u32(fields.next()?)?).ok()
}

/// `+ULSTFILE: "a","b"` lists files of one tag.
pub fn file_list_contains(line: &str, filename: &str) -> bool {
    match fields_after(line, "+ULSTFILE:") {
        Some(mut fields) => fields.any(|field| unquote(field) == filename),
        None => false,
    }
}

/// `+COPS: <mode>[,<format>,"<oper>"[,<act>]]`; an operator means registered.
pub fn parse_operator_registered(line: &str) -> Option<bool> {
    let fields = fields_after(line, "+COPS:")?;
    Some(fields.count() >= 3)
}

/// `+UPSND: <profile>,8,<status>`
pub fn parse_pdp_active(line: &str, profile: u8) -> Option<bool> {
    let mut fields = fields_after(line, "+UPSND:")?;
    if parse_u32(fields.next()?)? != u32::from(profile) || parse_u32(fields.next()?)? != 8 {
        return None;
    }
    Some(parse_u32(fields.next()?)? == 1)
}

/// `+UHTTPER: <profile>,<class>,<code>`
pub fn parse_http_error(line: &str) -> Option<(u16, u16)> {
    let mut fields = fields_after(line, "+UHTTPER:")?;
    let _profile = parse_u32(fields.next()?)?;
    let class = u16::try_from(parse_u32(fields.next()?)?).ok()?;
    let code = u16::try_from(parse_u32(fields.next()?)?).ok()?;
    Some((class, code))
}

fn fields_after<'a>(line: &'a str, prefix: &str) -> Option<impl Iterator<Item = &'a str>> {
    let rest = line.strip_prefix(prefix)?.trim();
    if rest.is_empty() {
        return None;
    }
    Some(rest.split(',').map(str::trim))
}

fn unquote(field: &str) -> &str {
    field
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(field)
}

pub(crate) fn parse_u32(text: &str) -> Option<u32> {
    if text.is_empty() {
        return None;
    }
    let mut value = 0u32;
    for byte in text.bytes() {
        if !byte.is_ascii_digit() {
            return None;
        }
        value = value.checked_mul(10)?.checked_add((byte - b'0') as u32)?;
    }
    Some(value)
}
