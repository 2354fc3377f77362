//! Destination commands from the selection layer.

use serde::{Deserialize, Serialize};

use crate::agent::AgentId;
use crate::grid::TilePos;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum AgentCommand {
    /// Send every listed agent toward the centre of `tile`.
    MoveTo { agents: Vec<AgentId>, tile: TilePos },
}
