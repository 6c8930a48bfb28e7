//! Service 0x01 (current data) PIDs the logger knows how to decode

use super::implementation::decode;
use super::PidCommand;

pid_commands! {
    /// Calculated engine load
    const ENGINE_LOAD = (0x01, 0x04, 1, "%", decode::percent);

    /// Engine coolant temperature
    const COOLANT_TEMPERATURE = (0x01, 0x05, 1, "°C", decode::temperature);

    /// Engine speed, in increments of 0.25
    const ENGINE_RPM = (0x01, 0x0C, 2, "rpm", decode::rpm);

    const VEHICLE_SPEED = (0x01, 0x0D, 1, "km/h", decode::byte);

    const INTAKE_AIR_TEMPERATURE = (0x01, 0x0F, 1, "°C", decode::temperature);

    /// Mass air flow sensor rate
    const MAF_AIR_FLOW_RATE = (0x01, 0x10, 2, "g/s", decode::air_flow);

    /// Absolute throttle position
    const THROTTLE_POSITION = (0x01, 0x11, 1, "%", decode::percent);

    /// Fuel tank level input
    const FUEL_LEVEL = (0x01, 0x2F, 1, "%", decode::percent);

    const CONTROL_MODULE_VOLTAGE = (0x01, 0x42, 2, "V", decode::voltage);
}
