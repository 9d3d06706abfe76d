const GROUP_SUFFIX: &str = "@g.us";

pub fn normalize_url(input: &str) -> String {
    let trimmed = input.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

/// User part of a JID, e.g. the phone number of `15551234567@s.whatsapp.net`.
pub fn phone_from_jid(jid: &str) -> &str {
    jid.split('@').next().unwrap_or(jid)
}

pub fn is_group_jid(jid: &str) -> bool {
    jid.ends_with(GROUP_SUFFIX)
}
