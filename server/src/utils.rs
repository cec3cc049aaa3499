use uuid::Uuid;

/// Mints a session-unique network id such as `a-3f2c...`.
pub fn mint_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

// Ship colour variants, handed out by connection id
const SHIP_VARIANTS: [&str; 8] = [
    "blue", "red", "green", "purple", "orange", "cyan", "magenta", "yellow",
];

pub fn ship_variant(connection: u32) -> &'static str {
    SHIP_VARIANTS[(connection.saturating_sub(1) as usize) % SHIP_VARIANTS.len()]
}

/// Sprite key the owning client renders its own ship with.
pub fn local_sprite(variant: &str) -> String {
    format!("ship-{}", variant)
}

/// Sprite key everybody else renders the ship with.
pub fn remote_sprite(variant: &str) -> String {
    format!("rival-{}", variant)
}

/// Strips a `ship-`/`rival-` prefix from a requested sprite key.
pub fn variant_from_key(key: &str) -> &str {
    key.strip_prefix("ship-")
        .or_else(|| key.strip_prefix("rival-"))
        .unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_mint_id_prefix_and_uniqueness() {
        let ids: HashSet<String> = (0..100).map(|_| mint_id("a")).collect();
        assert_eq!(ids.len(), 100);
        assert!(ids.iter().all(|id| id.starts_with("a-") && id.len() == 34));
    }

    #[test]
    fn test_ship_variant_cycles() {
        assert_eq!(ship_variant(1), "blue");
        assert_eq!(ship_variant(2), "red");
        assert_eq!(ship_variant(9), "blue");
        assert_eq!(ship_variant(0), "blue");
    }

    #[test]
    fn test_sprite_keys() {
        assert_eq!(local_sprite("green"), "ship-green");
        assert_eq!(remote_sprite("green"), "rival-green");
        assert_eq!(variant_from_key("ship-cyan"), "cyan");
        assert_eq!(variant_from_key("rival-cyan"), "cyan");
        assert_eq!(variant_from_key("gold"), "gold");
    }
}
