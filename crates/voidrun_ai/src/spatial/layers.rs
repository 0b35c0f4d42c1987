//! Spatial category layers: centralised constants для всех queries.
//!
//! ## Архитектура:
//! - **Layer (битовая маска):** к какой категории относится body
//! - **Mask (битовая маска):** какие категории видит query
//!
//! ## Layers:
//! - Bit 0 (1): Agents (участники arbitration)
//! - Bit 1 (2): Obstacles (стены, укрытия)
//! - Bit 2 (4): Projectiles
//! - Bit 3 (8): Melee attack volumes
//! - Bit 4 (16): Area effects
//! - Bit 5 (32): Environmental hazards

// ============================================================================
// Layer битовые маски
// ============================================================================

pub const LAYER_AGENTS: u32 = 0b1;
pub const LAYER_OBSTACLES: u32 = 0b10;
pub const LAYER_PROJECTILES: u32 = 0b100;
pub const LAYER_MELEE_ATTACKS: u32 = 0b1000;
pub const LAYER_AREA_EFFECTS: u32 = 0b1_0000;
pub const LAYER_HAZARDS: u32 = 0b10_0000;

// ============================================================================
// Query masks
// ============================================================================

/// Everything the threat sensor reacts to.
pub const MASK_THREATS: u32 =
    LAYER_PROJECTILES | LAYER_MELEE_ATTACKS | LAYER_AREA_EFFECTS | LAYER_HAZARDS;

/// Bodies that block movement rays and line of sight.
pub const MASK_OCCLUDERS: u32 = LAYER_OBSTACLES;

/// Projectiles stop on agents and obstacles (never on other projectiles).
pub const MASK_PROJECTILE_CONTACT: u32 = LAYER_AGENTS | LAYER_OBSTACLES;

pub const MASK_ALL: u32 = LAYER_AGENTS
    | LAYER_OBSTACLES
    | LAYER_PROJECTILES
    | LAYER_MELEE_ATTACKS
    | LAYER_AREA_EFFECTS
    | LAYER_HAZARDS;

/// Название слоя для debug логов
pub fn get_layer_name(layer_bits: u32) -> &'static str {
    match layer_bits {
        LAYER_AGENTS => "Agents",
        LAYER_OBSTACLES => "Obstacles",
        LAYER_PROJECTILES => "Projectiles",
        LAYER_MELEE_ATTACKS => "MeleeAttacks",
        LAYER_AREA_EFFECTS => "AreaEffects",
        LAYER_HAZARDS => "Hazards",
        _ => "Unknown",
    }
}
