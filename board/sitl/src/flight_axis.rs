use std::{
    str,
    sync::{mpsc, Arc, PoisonError, RwLock},
    thread::JoinHandle,
    time::{Duration, Instant},
};

use anyhow::{bail, Context};
use log::{info, warn};
use quick_xml::{events::Event, name::QName};
use teleop::{error::SinkError, Directive, PilotingCommand, VehicleSink};

pub const DEFAULT_FLIGHT_AXIS_URL: &str = "http://127.0.0.1:18083";

const CHANNEL_COUNT: usize = 12;
const ROLL_CHANNEL: usize = 0;
const PITCH_CHANNEL: usize = 1;
const THROTTLE_CHANNEL: usize = 2;
const YAW_CHANNEL: usize = 3;
const ARM_CHANNEL: usize = 4;

const PWM_MIN: i32 = 1000;
const PWM_CENTER: i32 = 1500;
const PWM_MAX: i32 = 2000;

macro_rules! soap_payload {
    ($body:expr) => {
        format!(
            r#"<?xml version='1.0' encoding='UTF-8'?>
            <soap:Envelope
                xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"
                xmlns:xsd="http://www.w3.org/2001/XMLSchema"
                xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
                    <soap:Body>{}</soap:Body>
            </soap:Envelope>"#,
            $body
        )
    };
}

/// Channel values sent to RealFlight and telemetry read back from it.
#[derive(Debug, Clone)]
pub struct FlightAxisState {
    pub output: [i32; CHANNEL_COUNT],
    pub input: [i32; CHANNEL_COUNT],
    pub connected: bool,
    pub airspeed: f64,
    pub groundspeed: f64,
    pub altitude: f64,
    pub pitch_rate: f64,
    pub roll_rate: f64,
    pub yaw_rate: f64,
    pub acceleration_x: f64,
    pub acceleration_y: f64,
    pub acceleration_z: f64,
    pub battery_voltage: f64,
}

impl FlightAxisState {
    pub fn new() -> Self {
        let mut neutral = [PWM_CENTER; CHANNEL_COUNT];
        neutral[THROTTLE_CHANNEL] = PWM_MIN;
        neutral[ARM_CHANNEL] = PWM_MIN;
        Self {
            output: neutral,
            input: neutral,
            connected: false,
            airspeed: 0.0,
            groundspeed: 0.0,
            altitude: 0.0,
            pitch_rate: 0.0,
            roll_rate: 0.0,
            yaw_rate: 0.0,
            acceleration_x: 0.0,
            acceleration_y: 0.0,
            acceleration_z: 0.0,
            battery_voltage: 0.0,
        }
    }
}

impl Default for FlightAxisState {
    fn default() -> Self {
        Self::new()
    }
}

type SharedState = Arc<RwLock<FlightAxisState>>;

enum WorkerCommand {
    Stop,
}

struct FlightAxisWorker {
    client: reqwest::blocking::Client,
    url: String,
    controller_started: bool,
    flight_axis_controller_is_active: bool,
    reset_button_has_been_pressed: bool,
}

impl FlightAxisWorker {
    fn new(url: String) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            url,
            controller_started: false,
            flight_axis_controller_is_active: false,
            reset_button_has_been_pressed: false,
        }
    }

    fn run(url: String, state: SharedState, rx: mpsc::Receiver<WorkerCommand>) -> JoinHandle<()> {
        let mut worker = Self::new(url);
        std::thread::spawn(move || {
            let mut last_loop_time = Instant::now();
            let minimum_elapsed_duration = Duration::from_millis(1000 / 200); // 200 Hz
            loop {
                match rx.try_recv() {
                    Ok(WorkerCommand::Stop) | Err(mpsc::TryRecvError::Disconnected) => return,
                    Err(mpsc::TryRecvError::Empty) => {}
                }
                let now = Instant::now();
                let dt = now.duration_since(last_loop_time);
                if dt < minimum_elapsed_duration {
                    std::thread::sleep(minimum_elapsed_duration - dt);
                    continue;
                }
                last_loop_time = now;

                let mut frame = state.read().unwrap_or_else(PoisonError::into_inner).clone();
                let result = worker.update(&mut frame);
                let mut shared = state.write().unwrap_or_else(PoisonError::into_inner);
                match result {
                    Ok(()) => {
                        // keep the freshest output written by the control loop meanwhile
                        frame.output = shared.output;
                        frame.connected = true;
                        *shared = frame;
                    }
                    Err(e) => {
                        shared.connected = false;
                        drop(shared);
                        worker.controller_started = false;
                        warn!("FlightAxis exchange failed: {:#}", e);
                        std::thread::sleep(Duration::from_secs(3));
                    }
                }
            }
        })
    }

    fn update(&mut self, state: &mut FlightAxisState) -> anyhow::Result<()> {
        if !self.controller_started
            || !self.flight_axis_controller_is_active
            || self.reset_button_has_been_pressed
        {
            info!("Restoring original controller device, resetting aircraft, and injecting UAV control");

            // restore first so we can attach after the aircraft is changed in RealFlight
            self.soap_action("RestoreOriginalControllerDevice")?;
            self.soap_action("ResetAircraft")?;
            self.soap_action("InjectUAVControllerInterface")?;

            self.controller_started = true;
        }

        let scaled_output: Vec<f64> = state
            .output
            .iter()
            .map(|&x| f64::from(x - PWM_MIN) / f64::from(PWM_MAX - PWM_MIN))
            .collect();

        self.soap_exchange_data(&scaled_output, state)
    }

    fn soap_action(&self, action: &str) -> anyhow::Result<()> {
        let body = format!("<{action}><a>1</a><b>2</b></{action}>");
        self.send_soap_action(action, soap_payload!(body))
            .with_context(|| format!("{} failed", action))?;
        Ok(())
    }

    fn soap_exchange_data(&mut self, data: &[f64], state: &mut FlightAxisState) -> anyhow::Result<()> {
        let payload = soap_payload!(format!(
            r#"<ExchangeData>
                        <pControlInputs>
                            <m-selectedChannels>4095</m-selectedChannels>
                            <m-channelValues-0to1>
                            {}
                            </m-channelValues-0to1>
                        </pControlInputs>
                    </ExchangeData>"#,
            data.iter()
                .map(|x| format!("<item>{}</item>", x))
                .collect::<Vec<String>>()
                .join("")
        ));

        let response = self.send_soap_action("ExchangeData", payload)?;

        self.parse_response(&response, state)
    }

    fn parse_response(&mut self, response: &str, state: &mut FlightAxisState) -> anyhow::Result<()> {
        let mut parser = quick_xml::Reader::from_str(response);
        let mut parsed_input = false;
        let mut parsed_aircraft_state = false;
        loop {
            match parser.read_event() {
                Ok(Event::Start(e)) => match e.name() {
                    QName(b"m-channelValues-0to1") => {
                        parsed_input = Self::parse_rc_input(&mut parser, state)?;
                    }
                    QName(b"m-aircraftState") => {
                        parsed_aircraft_state = self.parse_aircraft_state(&mut parser, state)?;
                    }
                    QName(b"m-notifications") => {
                        if let Ok(Event::Start(_)) = parser.read_event() {
                            let value = parser.read_text(QName(b"m-resetButtonHasBeenPressed"))?;
                            self.reset_button_has_been_pressed = value == "true";
                            if self.reset_button_has_been_pressed {
                                info!("Reset button has been pressed in RealFlight");
                            }
                        }
                    }
                    _ => {}
                },
                Ok(Event::Eof) => {
                    if !parsed_input || !parsed_aircraft_state {
                        bail!("Failed to parse input or aircraft state");
                    }
                    break;
                }
                Err(e) => bail!("Error while parsing response: {:?}", e),
                _ => {}
            }
        }
        Ok(())
    }

    fn parse_rc_input(
        parser: &mut quick_xml::Reader<&[u8]>,
        state: &mut FlightAxisState,
    ) -> anyhow::Result<bool> {
        let mut input = [0; CHANNEL_COUNT];
        for channel in input.iter_mut() {
            match parser.read_event() {
                Ok(Event::Start(e)) if e.name() == QName(b"item") => {
                    if let Ok(Event::Text(e)) = parser.read_event() {
                        let value = str::from_utf8(&e)?
                            .trim()
                            .parse::<f64>()
                            .context("Failed to parse channel value")?;
                        *channel = (value * f64::from(PWM_MAX - PWM_MIN)) as i32 + PWM_MIN;
                    }
                    // discard close tag
                    parser.read_event()?;
                }
                Ok(e) => bail!("Unexpected event {:?}", e),
                Err(e) => bail!("Error while parsing input: {:?}", e),
            }
        }
        state.input = input;
        Ok(true)
    }

    fn parse_aircraft_state(
        &mut self,
        parser: &mut quick_xml::Reader<&[u8]>,
        state: &mut FlightAxisState,
    ) -> anyhow::Result<bool> {
        let mut parsed_properties_count = 0;

        loop {
            match parser.read_event() {
                Ok(Event::Start(e)) => {
                    let name = e.name();
                    let value = parser.read_text(name)?;
                    let field = match name {
                        QName(b"m-flightAxisControllerIsActive") => {
                            self.flight_axis_controller_is_active = value == "true";
                            parsed_properties_count += 1;
                            continue;
                        }
                        QName(b"m-airspeed-MPS") => &mut state.airspeed,
                        QName(b"m-groundspeed-MPS") => &mut state.groundspeed,
                        QName(b"m-altitudeAGL-MTR") => &mut state.altitude,
                        QName(b"m-pitchRate-DEGpSEC") => &mut state.pitch_rate,
                        QName(b"m-rollRate-DEGpSEC") => &mut state.roll_rate,
                        QName(b"m-yawRate-DEGpSEC") => &mut state.yaw_rate,
                        QName(b"m-accelerationBodyAX-MPS2") => &mut state.acceleration_x,
                        QName(b"m-accelerationBodyAY-MPS2") => &mut state.acceleration_y,
                        QName(b"m-accelerationBodyAZ-MPS2") => &mut state.acceleration_z,
                        QName(b"m-batteryVoltage-VOLTS") => &mut state.battery_voltage,
                        _ => continue,
                    };
                    *field = value.parse::<f64>()?;
                    parsed_properties_count += 1;
                }
                Ok(Event::End(e)) if e.name() == QName(b"m-aircraftState") => break,
                Ok(Event::Eof) => bail!("Unexpected EOF in aircraft state"),
                Err(e) => bail!("Error while parsing aircraft state: {:?}", e),
                _ => {}
            }
        }

        Ok(parsed_properties_count == 11)
    }

    fn send_soap_action(&self, soap_action: &str, payload: String) -> anyhow::Result<String> {
        let res = self
            .client
            .post(&self.url)
            .header("content-type", "text/xml;charset='UTF-8'")
            .header("soapaction", soap_action)
            .header("connection", "Keep-Alive")
            .body(payload)
            .send()?;

        if res.status().is_success() {
            Ok(res.text()?)
        } else {
            bail!("Failed to send SOAP action {}: {:?}", soap_action, res.status())
        }
    }
}

/// Link to RealFlight's FlightAxis interface, exchanged from a background thread.
pub struct FlightAxis {
    url: String,
    state: SharedState,
    to_worker_tx: Option<mpsc::Sender<WorkerCommand>>,
    worker_thread: Option<JoinHandle<()>>,
}

impl FlightAxis {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            state: Arc::new(RwLock::new(FlightAxisState::new())),
            to_worker_tx: None,
            worker_thread: None,
        }
    }

    pub fn state(&self) -> FlightAxisState {
        self.state.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn shared_state(&self) -> Arc<RwLock<FlightAxisState>> {
        self.state.clone()
    }

    /// A vehicle sink writing into this link's channel outputs.
    pub fn sink(&self) -> FlightAxisSink {
        FlightAxisSink::new(self.state.clone())
    }

    pub fn start(&mut self) {
        let (to_worker_tx, to_worker_rx) = mpsc::channel();
        self.worker_thread = Some(FlightAxisWorker::run(
            self.url.clone(),
            self.state.clone(),
            to_worker_rx,
        ));
        self.to_worker_tx = Some(to_worker_tx);
        info!("FlightAxis link started on {}", self.url);
    }

    pub fn stop(&mut self) {
        if let Some(tx) = self.to_worker_tx.take() {
            let _ = tx.send(WorkerCommand::Stop);
        }
        if let Some(handle) = self.worker_thread.take() {
            if handle.join().is_err() {
                warn!("FlightAxis worker panicked");
            }
        }
    }
}

impl Drop for FlightAxis {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Maps piloting commands onto RC channels: sticks around 1500 µs, with an
/// arm switch raised by take-off and lowered by landing.
pub struct FlightAxisSink {
    state: SharedState,
    armed: bool,
    last: PilotingCommand,
}

impl FlightAxisSink {
    fn new(state: SharedState) -> Self {
        Self {
            state,
            armed: false,
            last: PilotingCommand::neutral(),
        }
    }

    fn stick(value: i8) -> i32 {
        PWM_CENTER + i32::from(value) * (PWM_MAX - PWM_CENTER) / 100
    }

    fn write_channels(&self) {
        let command = &self.last;
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let output = &mut state.output;
        output[ROLL_CHANNEL] = Self::stick(command.roll());
        output[PITCH_CHANNEL] = Self::stick(command.pitch());
        output[YAW_CHANNEL] = Self::stick(command.yaw());
        if self.armed {
            output[THROTTLE_CHANNEL] = Self::stick(command.throttle());
            output[ARM_CHANNEL] = PWM_MAX;
        } else {
            output[THROTTLE_CHANNEL] = PWM_MIN;
            output[ARM_CHANNEL] = PWM_MIN;
        }
    }
}

impl VehicleSink for FlightAxisSink {
    fn directive(&mut self, directive: Directive) -> Result<(), SinkError> {
        self.armed = directive == Directive::TakeOff;
        self.write_channels();
        Ok(())
    }

    fn pilot(&mut self, command: &PilotingCommand) -> Result<(), SinkError> {
        self.last = *command;
        self.write_channels();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use teleop::AxisValues;

    use super::*;

    fn response(items: &str) -> String {
        format!(
            "<soap:Envelope><soap:Body><ReturnData>\
             <m-previousInputsState><m-selectedChannels>-1</m-selectedChannels>\
             <m-channelValues-0to1>{items}</m-channelValues-0to1></m-previousInputsState>\
             <m-aircraftState>\
             <m-flightAxisControllerIsActive>true</m-flightAxisControllerIsActive>\
             <m-airspeed-MPS>12.5</m-airspeed-MPS>\
             <m-groundspeed-MPS>11</m-groundspeed-MPS>\
             <m-altitudeAGL-MTR>30.25</m-altitudeAGL-MTR>\
             <m-pitchRate-DEGpSEC>1</m-pitchRate-DEGpSEC>\
             <m-rollRate-DEGpSEC>-2</m-rollRate-DEGpSEC>\
             <m-yawRate-DEGpSEC>3</m-yawRate-DEGpSEC>\
             <m-accelerationBodyAX-MPS2>0.1</m-accelerationBodyAX-MPS2>\
             <m-accelerationBodyAY-MPS2>0.2</m-accelerationBodyAY-MPS2>\
             <m-accelerationBodyAZ-MPS2>-9.8</m-accelerationBodyAZ-MPS2>\
             <m-batteryVoltage-VOLTS>12.6</m-batteryVoltage-VOLTS>\
             </m-aircraftState>\
             <m-notifications><m-resetButtonHasBeenPressed>false</m-resetButtonHasBeenPressed></m-notifications>\
             </ReturnData></soap:Body></soap:Envelope>"
        )
    }

    #[test]
    fn test_parse_exchange_response() {
        let items = "<item>0.5</item>".repeat(CHANNEL_COUNT);
        let mut worker = FlightAxisWorker::new(DEFAULT_FLIGHT_AXIS_URL.to_string());
        let mut state = FlightAxisState::new();

        worker.parse_response(&response(&items), &mut state).unwrap();

        assert_eq!(state.input, [PWM_CENTER; CHANNEL_COUNT]);
        assert_eq!(state.airspeed, 12.5);
        assert_eq!(state.altitude, 30.25);
        assert_eq!(state.roll_rate, -2.0);
        assert_eq!(state.acceleration_z, -9.8);
        assert_eq!(state.battery_voltage, 12.6);
        assert!(worker.flight_axis_controller_is_active);
        assert!(!worker.reset_button_has_been_pressed);
    }

    #[test]
    fn test_parse_rejects_short_channel_list() {
        let items = "<item>0.5</item>".repeat(3);
        let mut worker = FlightAxisWorker::new(DEFAULT_FLIGHT_AXIS_URL.to_string());
        let mut state = FlightAxisState::new();
        assert!(worker.parse_response(&response(&items), &mut state).is_err());
    }

    fn active(roll: i8, pitch: i8, yaw: i8, throttle: i8) -> PilotingCommand {
        PilotingCommand::from_axes(AxisValues {
            roll,
            pitch,
            yaw,
            throttle,
        })
    }

    #[test]
    fn test_sink_keeps_throttle_low_until_takeoff() {
        let link = FlightAxis::new(DEFAULT_FLIGHT_AXIS_URL);
        let mut sink = link.sink();

        sink.pilot(&active(100, -100, 0, 100)).unwrap();
        let output = link.state().output;
        assert_eq!(output[ROLL_CHANNEL], 2000);
        assert_eq!(output[PITCH_CHANNEL], 1000);
        assert_eq!(output[YAW_CHANNEL], 1500);
        assert_eq!(output[THROTTLE_CHANNEL], PWM_MIN);
        assert_eq!(output[ARM_CHANNEL], PWM_MIN);

        sink.directive(Directive::TakeOff).unwrap();
        sink.pilot(&active(0, 0, 0, 100)).unwrap();
        let output = link.state().output;
        assert_eq!(output[ARM_CHANNEL], PWM_MAX);
        assert_eq!(output[THROTTLE_CHANNEL], 2000);

        sink.directive(Directive::Landing).unwrap();
        let output = link.state().output;
        assert_eq!(output[ARM_CHANNEL], PWM_MIN);
        assert_eq!(output[THROTTLE_CHANNEL], PWM_MIN);
    }

    #[test]
    fn test_neutral_command_centres_sticks() {
        let link = FlightAxis::new(DEFAULT_FLIGHT_AXIS_URL);
        let mut sink = link.sink();
        sink.directive(Directive::TakeOff).unwrap();
        sink.pilot(&active(100, 100, 100, 100)).unwrap();
        sink.pilot(&PilotingCommand::neutral()).unwrap();
        let output = link.state().output;
        assert_eq!(output[ROLL_CHANNEL], PWM_CENTER);
        assert_eq!(output[PITCH_CHANNEL], PWM_CENTER);
        assert_eq!(output[YAW_CHANNEL], PWM_CENTER);
        assert_eq!(output[THROTTLE_CHANNEL], PWM_CENTER);
    }
}
