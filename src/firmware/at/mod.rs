//! AT command line protocol shared by every modem user.

mod client;
mod parse;
mod urc;

pub use client::AtClient;
pub use parse::{
    file_list_contains, final_result, is_urc, parse_http_complete, parse_http_error,
    parse_install_progress, parse_operator_registered, parse_pdp_active, parse_pdp_deactivation,
    HttpsResponse,
};
pub(crate) use parse::parse_u32;
pub use urc::UrcMailbox;

pub use super::system::{AtResult, AtTransport};
