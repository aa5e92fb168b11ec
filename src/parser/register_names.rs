use super::error::ParserError as Error;
use hashbrown::HashMap;
use lazy_static::lazy_static;

pub const REGISTER_COUNT: usize = 32;

/// Register that receives the return address on `call`/`callr`
pub const LINK_REGISTER: u8 = 31;

/// Named registers, `et` is r24 and `ra` is r31
pub const ALIASES: [&str; 8] = ["et", "bt", "gp", "sp", "fp", "ea", "sstatus", "ra"];

lazy_static! {
    static ref ALIAS_MAP: HashMap<&'static str, String> = ALIASES
        .iter()
        .enumerate()
        .map(|(i, &name)| (name, format!("r{}", 24 + i)))
        .collect();
}

/// If `token` looks like `rN`, returns `N`. Numbers too big to fit are saturated, they're never
/// valid registers anyway.
pub fn register_number(token: &str) -> Option<u32> {
    let digits = token.strip_prefix('r')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(digits.parse().unwrap_or(u32::MAX))
}

/// Replaces register aliases by their `rN` name and rejects `rN` tokens with `N > 31`
pub fn resolve(token: &str) -> Result<Option<&'static str>, Error> {
    if let Some(alias) = ALIAS_MAP.get(token) {
        return Ok(Some(alias.as_str()));
    }

    match register_number(token) {
        Some(n) if n as usize >= REGISTER_COUNT => Err(Error::UnknownRegister(token.to_owned())),
        _ => Ok(None),
    }
}
