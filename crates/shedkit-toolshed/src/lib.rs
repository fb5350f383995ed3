mod client;

pub use client::{
    installable_revisions_url, parse_installable_revisions, ToolShedClient,
    DEFAULT_REQUEST_TIMEOUT,
};
