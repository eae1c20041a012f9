use rand::distr::Alphanumeric;
use rand::Rng;

use crate::constants::NICKNAME_MAX_CHARS;
use crate::error::EngineError;
use crate::types::BotArchetype;

pub fn sanitize_nickname(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "Player".to_string();
    }
    trimmed
        .chars()
        .filter(|ch| !ch.is_control())
        .take(NICKNAME_MAX_CHARS)
        .collect()
}

pub fn parse_bot_archetypes(raw: &str) -> Result<Vec<BotArchetype>, EngineError> {
    let mut archetypes = Vec::new();
    for item in raw.split(',').map(str::trim).filter(|item| !item.is_empty()) {
        let archetype = item.parse::<BotArchetype>()?;
        if !archetypes.contains(&archetype) {
            archetypes.push(archetype);
        }
    }
    Ok(archetypes)
}

pub fn random_token(len: usize) -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
