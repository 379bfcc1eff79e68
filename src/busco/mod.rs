//! BUSCO 结果的读取、单拷贝 BUSCO 的筛选与按 BUSCO 重新分组。

pub mod regroup;
pub mod scan;
pub mod select;

pub use regroup::{regroup, MarkerFasta};
pub use scan::{scan_input, SpeciesRun};
pub use select::Occupancy;
