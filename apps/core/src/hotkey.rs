#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hotkey {
    pub modifiers: Vec<String>,
    pub key: String,
}

/// Splits a `Modifier+...+Key` chord. Validation of the individual parts is
/// left to the registrar and to `settings::validate_hotkey`.
pub fn parse_hotkey(input: &str) -> Result<Hotkey, String> {
    let parts: Vec<&str> = input
        .split('+')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();
    if parts.len() < 2 {
        return Err(format!("invalid hotkey '{input}'"));
    }

    Ok(Hotkey {
        modifiers: parts[..parts.len() - 1]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        key: parts[parts.len() - 1].to_string(),
    })
}
