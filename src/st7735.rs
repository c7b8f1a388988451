//! Configuration for ST7735-based 128x160 panels.

use crate::Config;

/// Native panel width at rotation 0.
pub const WIDTH: u16 = 128;

/// Native panel height at rotation 0.
pub const HEIGHT: u16 = 160;

/// Fastest SPI write clock the controller accepts.
pub const MAX_WRITE_SPI_HZ: u32 = 15_000_000;

/// Read-back requires a slower clock than writes.
pub const MAX_READ_SPI_HZ: u32 = 6_600_000;

/// Memory-access-control values for rotations 0..=3: row/column exchange and
/// mirroring, RGB colour order.
const MADCTL: [u8; 4] = [0xC0, 0xA0, 0x00, 0x60];

/// Power-on sequence for the red-tab panel variant: frame rate, power and
/// gamma settings, then normal display mode. See [`crate::Tft::init`] for
/// the table format.
#[rustfmt::skip]
const INIT_SEQUENCE: [u8; 97] = [
    0x11, 0x80, 0xFF, // SLPOUT, settle (255 encodes 500 ms)
    0xB1, 0x03, 0x01, 0x2C, 0x2D, // FRMCTR1: normal mode frame rate
    0xB2, 0x03, 0x01, 0x2C, 0x2D, // FRMCTR2: idle mode frame rate
    0xB3, 0x06, 0x01, 0x2C, 0x2D, 0x01, 0x2C, 0x2D, // FRMCTR3: partial mode
    0xB4, 0x01, 0x07, // INVCTR: no dot inversion
    0xC0, 0x03, 0xA2, 0x02, 0x84, // PWCTR1
    0xC1, 0x01, 0xC5, // PWCTR2
    0xC2, 0x02, 0x0A, 0x00, // PWCTR3
    0xC3, 0x02, 0x8A, 0x2A, // PWCTR4
    0xC4, 0x02, 0x8A, 0xEE, // PWCTR5
    0xC5, 0x01, 0x0E, // VMCTR1
    0x20, 0x00, // INVOFF
    0x36, 0x01, 0xC0, // MADCTL: rotation 0
    0x3A, 0x01, 0x05, // COLMOD: 16-bit colour
    0xE0, 0x10, // GMCTRP1: positive gamma
    0x02, 0x1C, 0x07, 0x12, 0x37, 0x32, 0x29, 0x2D,
    0x29, 0x25, 0x2B, 0x39, 0x00, 0x01, 0x03, 0x10,
    0xE1, 0x10, // GMCTRN1: negative gamma
    0x03, 0x1D, 0x07, 0x06, 0x2E, 0x2C, 0x29, 0x2D,
    0x2E, 0x2E, 0x37, 0x3F, 0x00, 0x00, 0x02, 0x10,
    0x13, 0x80, 0x0A, // NORON, settle 10 ms
    0x29, 0x80, 0x64, // DISPON, settle 100 ms
];

/// The driver configuration for this panel.
pub fn config() -> Config<'static> {
    Config {
        width: WIDTH,
        height: HEIGHT,
        madctl: MADCTL,
        init_sequence: &INIT_SEQUENCE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_sequence_records_are_well_formed() {
        let mut table: &[u8] = &INIT_SEQUENCE;
        let mut commands = 0;
        while !table.is_empty() {
            assert!(table.len() >= 2, "dangling command byte");
            let nargs = (table[1] & 0x7F) as usize;
            let record_len = 2 + nargs + usize::from(table[1] & 0x80 != 0);
            assert!(table.len() >= record_len, "truncated record 0x{:02X}", table[0]);
            table = &table[record_len..];
            commands += 1;
        }
        assert_eq!(commands, 18);
    }
}
