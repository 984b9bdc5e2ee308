pub mod clock;
pub mod engine;
pub mod orders;
pub mod state;
pub mod window;

pub use clock::{ClockReading, DemandFactors, FixedClock, SteppingClock, SystemClock, TimeSource};
pub use engine::{EngineSettings, SimulationRun, TickEngine, TickReport, TickSummary};
pub use state::{OrderSample, ProductState, SimulationState, WarehouseStock};
pub use window::RollingWindow;
