//! Services module
//!
//! Este módulo contiene la lógica de negocio: el orquestador del ciclo de
//! vida de viajes y las piezas inyectables de las que depende (política de
//! asignación, fuente de distancia y reloj).

pub mod assignment_policy;
pub mod clock;
pub mod distance_service;
pub mod trip_lifecycle_service;

pub use assignment_policy::{AssignmentPolicy, FixedSelection, RandomSelection, SelectionStrategy};
pub use clock::{Clock, ManualClock, SystemClock};
pub use distance_service::{DistanceSource, FixedDistance, SimulatedDistance};
pub use trip_lifecycle_service::{StartTripCommand, TripLifecycleService};
