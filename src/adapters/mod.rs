//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements       | Connects to                  |
//! |----------------|------------------|------------------------------|
//! | `eeprom`       | PersistentStore  | NVS blob / in-memory image   |
//! | `wifi`         | NetworkPort      | ESP-IDF WiFi STA + AP        |
//! | `time`         | Clock            | ESP32 system timer           |
//! | `indicator`    | Indicator        | PWM channel (readiness LED)  |
//! | `pwm_actuator` | Actuator         | PWM channels per capability  |
//! | `http_update`  | FirmwareUpdater  | HTTP client + OTA partitions |
//! | `log_sink`     | EventSink        | Serial log output            |
//! | `device_id`    |                  | Factory MAC (eFuse)          |

pub mod device_id;
pub mod eeprom;
pub mod http_update;
pub mod indicator;
pub mod log_sink;
pub mod pwm_actuator;
pub mod time;
pub mod wifi;
