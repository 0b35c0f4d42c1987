//! Movement behaviors: стратегии перемещения для movement arbitrator.
//!
//! Содержит:
//! - CombatRepositioningBehavior (strafe / 8-direction sampling, fallback слоя)
//! - DashBehavior (рывок к цели, locked direction)
//! - DodgeBehavior (уклонение от самой опасной угрозы)
//! - FormationBehavior (flocking: cohesion + alignment + separation)
//! - PatrolBehavior (квадратный маршрут вокруг точки активации)

pub mod combat_reposition;
pub mod dash;
pub mod dodge;
pub mod formation;
pub mod patrol;

pub use combat_reposition::CombatRepositioningBehavior;
pub use dash::DashBehavior;
pub use dodge::DodgeBehavior;
pub use formation::FormationBehavior;
pub use patrol::PatrolBehavior;
