//! One-shot hardware peripheral initialization.
//!
//! Configures GPIO directions, the WiReach control pins, and the UART
//! drivers using raw ESP-IDF sys calls. Called once from `main()`
//! before the tick loop starts.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    UartConfigFailed(i32),
    UartDriverFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::UartConfigFailed(rc) => write!(f, "UART param config failed (rc={})", rc),
            Self::UartDriverFailed(rc) => write!(f, "UART driver install failed (rc={})", rc),
        }
    }
}

#[cfg(target_os = "espidf")]
use log::info;

// ── Peripheral bring-up ───────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: called once from main() before the tick loop; single-threaded.
    unsafe {
        init_gpio_outputs()?;
        init_wireach_control_pins()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

#[cfg(target_os = "espidf")]
unsafe fn config_output_pin(pin: i32) -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pin,
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    Ok(())
}

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs() -> Result<(), HwInitError> {
    for &pin in &pins::OUTPUT_GPIOS {
        unsafe {
            config_output_pin(pin)?;
            gpio_set_level(pin, 0);
        }
    }
    Ok(())
}

#[cfg(target_os = "espidf")]
unsafe fn init_wireach_control_pins() -> Result<(), HwInitError> {
    unsafe {
        // MSEL held HIGH selects serial host mode.
        config_output_pin(pins::WIREACH_MSEL_GPIO)?;
        gpio_set_level(pins::WIREACH_MSEL_GPIO, 1);

        // RESET is active-low; release it.
        config_output_pin(pins::WIREACH_RESET_GPIO)?;
        gpio_set_level(pins::WIREACH_RESET_GPIO, 1);
    }
    Ok(())
}

// ── GPIO write helper ─────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: pin was configured as an output during init_peripherals().
    unsafe {
        gpio_set_level(pin, u32::from(high));
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) {}

// ── UART driver install ───────────────────────────────────────

/// RX ring buffer handed to the UART driver. Generous relative to the
/// poll cadence so a chatty adapter cannot overrun between ticks.
#[cfg(target_os = "espidf")]
const UART_RX_BUF: i32 = 1024;
#[cfg(target_os = "espidf")]
const UART_TX_BUF: i32 = 1024;

#[cfg(target_os = "espidf")]
pub fn uart_init(port: i32, tx_pin: i32, rx_pin: i32, baud: u32) -> Result<(), HwInitError> {
    let cfg = uart_config_t {
        baud_rate: baud as i32,
        data_bits: uart_word_length_t_UART_DATA_8_BITS,
        parity: uart_parity_t_UART_PARITY_DISABLE,
        stop_bits: uart_stop_bits_t_UART_STOP_BITS_1,
        flow_ctrl: uart_hw_flowcontrol_t_UART_HW_FLOWCTRL_DISABLE,
        ..Default::default()
    };

    // SAFETY: called once per port from main() before the tick loop.
    unsafe {
        let ret = uart_param_config(port, &cfg);
        if ret != ESP_OK {
            return Err(HwInitError::UartConfigFailed(ret));
        }
        let ret = uart_set_pin(port, tx_pin, rx_pin, -1, -1);
        if ret != ESP_OK {
            return Err(HwInitError::UartConfigFailed(ret));
        }
        let ret = uart_driver_install(port, UART_RX_BUF, UART_TX_BUF, 0, core::ptr::null_mut(), 0);
        if ret != ESP_OK {
            return Err(HwInitError::UartDriverFailed(ret));
        }
    }
    info!("hw_init: UART{} up at {} baud", port, baud);
    Ok(())
}
