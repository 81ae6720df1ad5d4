//! Declarative plan builders.
//!
//! A plan is a flat sequence of instructions the engine executes one by one:
//! move a motor, trigger-and-read a set of devices, or mark a checkpoint (a
//! suspension point in a real engine; a no-op here). The builders mirror the
//! common acquisition patterns: repeated counts, 1D scans, and 2D rasters.

/// One instruction within a plan.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanCommand {
    /// Move a motor to an absolute position and wait for completion.
    Set { device: String, position: f64 },
    /// Trigger the named devices and bundle their readings into one event.
    TriggerRead { devices: Vec<String> },
    /// A safe place to pause/resume. The simulated engine just logs it.
    Checkpoint,
}

/// A named command sequence.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Plan type recorded in the start document (e.g. "scan").
    pub plan_type: String,
    /// Human-readable name recorded in the start document.
    pub plan_name: String,
    pub commands: Vec<PlanCommand>,
}

/// `num` repeated readings of `detectors` at the current position.
pub fn count(detectors: &[&str], num: usize) -> Plan {
    let devices: Vec<String> = detectors.iter().map(|s| s.to_string()).collect();
    let mut commands = Vec::with_capacity(num);
    for _ in 0..num {
        commands.push(PlanCommand::TriggerRead {
            devices: devices.clone(),
        });
    }
    Plan {
        plan_type: "count".to_string(),
        plan_name: format!("count x{num}"),
        commands,
    }
}

/// Evenly spaced positions from `start` to `stop` inclusive.
pub fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => vec![],
        1 => vec![start],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            (0..num).map(|i| start + step * i as f64).collect()
        }
    }
}

/// 1D scan: step `motor` across `num` points, reading motor plus detectors at
/// each step.
pub fn scan(detectors: &[&str], motor: &str, start: f64, stop: f64, num: usize) -> Plan {
    let mut devices: Vec<String> = vec![motor.to_string()];
    devices.extend(detectors.iter().map(|s| s.to_string()));

    let mut commands = Vec::with_capacity(num * 3);
    for position in linspace(start, stop, num) {
        commands.push(PlanCommand::Set {
            device: motor.to_string(),
            position,
        });
        commands.push(PlanCommand::TriggerRead {
            devices: devices.clone(),
        });
        commands.push(PlanCommand::Checkpoint);
    }
    Plan {
        plan_type: "scan".to_string(),
        plan_name: format!("scan {motor} [{start}, {stop}] x{num}"),
        commands,
    }
}

/// Peak-hunting tweak: read once at `start`, then apply each relative step
/// to `motor` in turn, reading after every move.
///
/// Steps come from whatever drove the session (a console prompt, a search
/// routine); the plan replays them against absolute positions.
pub fn tweak(detector: &str, motor: &str, start: f64, steps: &[f64]) -> Plan {
    let devices = vec![motor.to_string(), detector.to_string()];
    let mut commands = Vec::with_capacity(steps.len() * 2 + 2);
    commands.push(PlanCommand::Set {
        device: motor.to_string(),
        position: start,
    });
    commands.push(PlanCommand::TriggerRead {
        devices: devices.clone(),
    });
    let mut position = start;
    for step in steps {
        position += step;
        commands.push(PlanCommand::Set {
            device: motor.to_string(),
            position,
        });
        commands.push(PlanCommand::TriggerRead {
            devices: devices.clone(),
        });
    }
    Plan {
        plan_type: "tweak".to_string(),
        plan_name: format!("tweak {motor}"),
        commands,
    }
}

/// 2D raster: outer loop over `motor_y`, inner loop over `motor_x`. With
/// `snake`, every other inner traversal reverses direction to avoid the
/// flyback move.
#[allow(clippy::too_many_arguments)]
pub fn outer_product_scan(
    detectors: &[&str],
    motor_y: &str,
    y_start: f64,
    y_stop: f64,
    y_num: usize,
    motor_x: &str,
    x_start: f64,
    x_stop: f64,
    x_num: usize,
    snake: bool,
) -> Plan {
    let mut devices: Vec<String> = vec![motor_y.to_string(), motor_x.to_string()];
    devices.extend(detectors.iter().map(|s| s.to_string()));

    let xs = linspace(x_start, x_stop, x_num);
    let mut commands = Vec::new();
    for (row, y) in linspace(y_start, y_stop, y_num).into_iter().enumerate() {
        commands.push(PlanCommand::Set {
            device: motor_y.to_string(),
            position: y,
        });
        let reversed = snake && row % 2 == 1;
        let row_xs: Vec<f64> = if reversed {
            xs.iter().rev().copied().collect()
        } else {
            xs.clone()
        };
        for x in row_xs {
            commands.push(PlanCommand::Set {
                device: motor_x.to_string(),
                position: x,
            });
            commands.push(PlanCommand::TriggerRead {
                devices: devices.clone(),
            });
            commands.push(PlanCommand::Checkpoint);
        }
    }
    Plan {
        plan_type: "outer_product_scan".to_string(),
        plan_name: format!("raster {motor_y} x {motor_x} ({y_num}x{x_num})"),
        commands,
    }
}
