use std::{
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};

use log::info;
use teleop::{AxisResolver, KeyStateTracker, Listening, LogicalAction};

use crate::{flight_axis::FlightAxisState, input};

/// Window acting as the key-event source for the control loop.
pub struct TeleopApp {
    state: State,
    keys: Arc<KeyStateTracker>,
    telemetry: Option<Arc<RwLock<FlightAxisState>>>,
}

impl TeleopApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        keys: Arc<KeyStateTracker>,
        telemetry: Option<Arc<RwLock<FlightAxisState>>>,
    ) -> Self {
        Self {
            state: State::Listening,
            keys,
            telemetry,
        }
    }

    fn pump_key_events(&mut self, ctx: &egui::Context) {
        let events = ctx.input(|i| i.events.clone());
        for event in events {
            if let egui::Event::Key {
                key,
                pressed,
                repeat,
                ..
            } = event
            {
                if repeat {
                    continue;
                }
                let key = input::key_id(key);
                let listening = if pressed {
                    self.keys.on_press(key)
                } else {
                    self.keys.on_release(key)
                };
                if listening == Listening::Stop {
                    info!("Quit key pressed, closing teleop window");
                    self.state = State::Stopping;
                    return;
                }
            }
        }
    }

    fn controls_ui(&self, ui: &mut egui::Ui) {
        egui::Grid::new("bindings").striped(true).show(ui, |ui| {
            for (action, key) in self.keys.bindings().iter() {
                let held = self.keys.is_action_pressed(action);
                ui.label(action.name());
                ui.label(if held {
                    egui::RichText::new(key.to_string()).strong()
                } else {
                    egui::RichText::new(key.to_string())
                });
                ui.end_row();
            }
        });
    }

    fn axes_ui(&self, ui: &mut egui::Ui) {
        let axes = AxisResolver::new(&self.keys).values();
        for (name, value) in [
            ("Roll", axes.roll),
            ("Pitch", axes.pitch),
            ("Yaw", axes.yaw),
            ("Throttle", axes.throttle),
        ] {
            ui.horizontal(|ui| {
                ui.label(format!("{}:", name));
                ui.label(format!("{:+}", value));
            });
        }
        if self.keys.is_action_pressed(LogicalAction::TakeOff) {
            ui.label("Take-off held");
        }
        if self.keys.is_action_pressed(LogicalAction::Landing) {
            ui.label("Landing held");
        }
        let held: Vec<String> = self
            .keys
            .pressed_keys()
            .into_iter()
            .map(|key| match self.keys.bindings().action_for(key) {
                Some(action) => format!("{} ({})", key, action),
                None => key.to_string(),
            })
            .collect();
        ui.label(format!("Held: {}", held.join(", ")));
    }

    fn telemetry_ui(ui: &mut egui::Ui, state: &FlightAxisState) {
        ui.label(if state.connected {
            "RealFlight connected"
        } else {
            "RealFlight not connected"
        });
        for (name, value) in [
            ("Roll Rate", format!("{:.2} deg/s", state.roll_rate)),
            ("Pitch Rate", format!("{:.2} deg/s", state.pitch_rate)),
            ("Yaw Rate", format!("{:.2} deg/s", state.yaw_rate)),
            ("Altitude", format!("{:.2} m", state.altitude)),
            ("Airspeed", format!("{:.2} m/s", state.airspeed)),
            ("Battery", format!("{:.2} V", state.battery_voltage)),
        ] {
            ui.horizontal(|ui| {
                ui.label(format!("{}:", name));
                ui.label(value);
            });
        }
    }
}

impl eframe::App for TeleopApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        match self.state {
            State::Listening => {
                self.pump_key_events(ctx);
                ctx.request_repaint_after(Duration::from_millis(1000 / 20)); // 20 Hz
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("DucPilot Teleop");
                    ui.label("Focus this window and fly with the keys below.");
                    ui.separator();
                    ui.columns(2, |columns| {
                        self.controls_ui(&mut columns[0]);
                        self.axes_ui(&mut columns[1]);
                        if let Some(telemetry) = &self.telemetry {
                            let state = telemetry.read().unwrap_or_else(PoisonError::into_inner).clone();
                            columns[1].separator();
                            Self::telemetry_ui(&mut columns[1], &state);
                        }
                    });
                });
            }
            State::Stopping => {
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                self.state = State::Stopped;
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Stopping DucPilot Teleop");
                });
            }
            State::Stopped => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("DucPilot Teleop Stopped");
                });
            }
        }
    }
}

enum State {
    Listening,
    Stopping,
    Stopped,
}
