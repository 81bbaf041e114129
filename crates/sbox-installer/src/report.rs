//! Door wiring report.
//!
//! Walks the door table and prints the input and output blocks of every
//! door, which lets a technician check the wiring one door at a time:
//!
//! ```text
//! INPUT : 1F4 => [0 0 0 0 0 0 0 0 0]
//! OUTPUT: 19A => [0 1 0 0 0 0 0 0 0]
//! -------------------------
//! ```

use std::io::Write;
use std::time::Duration;

use sbox_core::{Action, ActionOutput, Door, Result};
use sbox_hardware::{ActionDispatcher, RegisterMaster};
use tracing::debug;

const SEPARATOR: &str = "-------------------------";

/// Readings taken for one door.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoorStatus {
    pub name: String,
    pub input: ActionOutput,
    pub output: ActionOutput,
}

/// Read every door in order, writing the report to `out`.
///
/// `pace` is slept between doors, not after the last one. The first failed
/// read aborts the report.
pub async fn report_doors<M, W>(
    dispatcher: &mut ActionDispatcher<M>,
    doors: &[Door],
    pace: Option<Duration>,
    out: &mut W,
) -> Result<Vec<DoorStatus>>
where
    M: RegisterMaster,
    W: Write,
{
    let mut statuses = Vec::with_capacity(doors.len());

    for (index, door) in doors.iter().enumerate() {
        if index > 0
            && let Some(pace) = pace
        {
            tokio::time::sleep(pace).await;
        }

        debug!(door = %door.name, "Reading door");

        let input = dispatcher
            .dispatch_command(Action::ReadInput.keyword(), &door.input)
            .await?;
        writeln!(out, "INPUT : {} => {}", door.input, input)?;

        let output = dispatcher
            .dispatch_command(Action::ReadCoil.keyword(), &door.output)
            .await?;
        writeln!(out, "OUTPUT: {} => {}", door.output, output)?;
        writeln!(out, "{SEPARATOR}")?;

        statuses.push(DoorStatus {
            name: door.name.clone(),
            input,
            output,
        });
    }

    Ok(statuses)
}
