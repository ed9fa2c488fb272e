//! Interactive device selection

use crate::discovery::DiscoveredDevice;
use crate::error::{RemoteError, Result};
use std::io::{BufRead, Write};

/// One `[i] base_url hostname` line per device
pub fn format_device_list(devices: &[DiscoveredDevice]) -> String {
    devices
        .iter()
        .enumerate()
        .map(|(index, device)| {
            if device.hostname.is_empty() {
                format!("[{}] {}\n", index, device.base_url())
            } else {
                format!("[{}] {} {}\n", index, device.base_url(), device.hostname)
            }
        })
        .collect()
}

/// Print the list and read an index from `input`
///
/// Range checking is left to the coordinator, so an out-of-range number is
/// returned as is. Anything that is not a number is [`RemoteError::NoSelection`].
pub fn prompt_pick_index<R: BufRead, W: Write>(
    devices: &[DiscoveredDevice],
    mut input: R,
    mut output: W,
) -> Result<usize> {
    writeln!(output, "Multiple devices found:")?;
    write!(output, "{}", format_device_list(devices))?;
    write!(output, "Select device index: ")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    line.trim().parse().map_err(|_| RemoteError::NoSelection)
}
