//! The command set for the SH1106.
//!
//! Note 1: The display RAM of the SH1106 is arranged in 8 pages of 132
//! columns, where each page is 8 vertically-adjacent rows and each byte in a
//! page drives the 8 rows of one column, least-significant bit topmost.
//! 128-column panels are wired to the center of the RAM, so column 0 of the
//! panel is RAM column 2.

use crate::error::Error;

pub mod consts {
    //! Geometry of the SH1106 as wired to a 128x64 panel.

    pub const NUM_PIXEL_COLS: usize = 128;
    pub const NUM_PIXEL_ROWS: usize = 64;
    pub const PAGE_HEIGHT: usize = 8;
    pub const NUM_PAGES: usize = NUM_PIXEL_ROWS / PAGE_HEIGHT;
    pub const FRAME_BYTES: usize = NUM_PIXEL_COLS * NUM_PAGES;
    /// RAM column corresponding to panel column 0. (Note 1)
    pub const COLUMN_OFFSET: u8 = 2;
    /// Transactions per frame transfer: one addressing preamble and one data
    /// burst per page.
    pub const TRANSACTIONS_PER_FRAME: usize = 2 * NUM_PAGES;
    pub const PIXEL_ROW_MAX: u8 = NUM_PIXEL_ROWS as u8 - 1;
    pub const PAGE_MAX: u8 = NUM_PAGES as u8 - 1;
}

use self::consts::*;

/// One step of the power-on sequence: an opcode sent on the command channel,
/// followed by argument bytes sent on the data channel.
pub struct InitCommand {
    pub opcode: u8,
    pub args: &'static [u8],
}

/// The power-on initialization sequence. It is fixed and order-sensitive:
/// the controller latches charge-pump, multiplex, and scan settings in this
/// order, and any deviation breaks compatibility with the panels this driver
/// targets. The display is off for the whole sequence and switched on by the
/// final step.
pub const INIT_SEQUENCE: &[InitCommand] = &[
    InitCommand { opcode: 0xAE, args: &[] },     // display off
    InitCommand { opcode: 0xD5, args: &[] },     // clock divide ratio
    InitCommand { opcode: 0x50, args: &[] },     // oscillator frequency
    InitCommand { opcode: 0xA8, args: &[0x3F] }, // multiplex ratio, 64 rows
    InitCommand { opcode: 0xD3, args: &[0x00] }, // display offset
    InitCommand { opcode: 0x40, args: &[] },     // start line 0
    InitCommand { opcode: 0xAD, args: &[0x8B] }, // charge pump on
    InitCommand { opcode: 0xA1, args: &[] },     // segment remap reversed
    InitCommand { opcode: 0xC8, args: &[] },     // COM scan decrement
    InitCommand { opcode: 0xDA, args: &[0x12] }, // COM pins alternative
    InitCommand { opcode: 0x81, args: &[0x80] }, // contrast
    InitCommand { opcode: 0xD9, args: &[0x22] }, // precharge period
    InitCommand { opcode: 0xDB, args: &[0x35] }, // VCOM deselect level
    InitCommand { opcode: 0xA6, args: &[] },     // non-inverted
    InitCommand { opcode: 0xAF, args: &[] },     // display on
];

/// Encode the three-byte addressing preamble that positions the controller's
/// write cursor at panel column 0 of `page`: the page start address, then the
/// low and high nibbles of the RAM column start address. One such preamble is
/// clocked out on the command channel ahead of every 128-byte page burst.
pub fn page_cursor(page: u8) -> [u8; 3] {
    debug_assert!(page <= PAGE_MAX);
    [
        0xB0 | (page & PAGE_MAX),
        COLUMN_OFFSET & 0x0F,
        0x10 | (COLUMN_OFFSET >> 4),
    ]
}

/// Commands the controller accepts after initialization. Each sends one
/// opcode on the command channel, plus at most one argument byte on the data
/// channel.
#[derive(Clone, Copy)]
pub enum Command {
    /// Control sleep mode. Entering sleep blanks the panel and cuts the
    /// matrix drive current; display RAM is retained.
    SetSleepMode(bool),
    /// Set the contrast current. Range 0-255.
    SetContrast(u8),
    /// Invert the luminance sense of every pixel, without modifying display
    /// RAM.
    SetInverted(bool),
    /// Set the display start line. Setting this to e.g. 40 will cause the
    /// first row of pixels on the panel to display RAM row 40, with rows
    /// 0-39 wrapped to the bottom, "rolling" the displayed image upwards.
    /// Range is 0-63.
    SetStartLine(u8),
}

macro_rules! ok_command {
    ($buf:ident, $cmd:expr,[]) => {
        Ok(($cmd, &$buf[..0]))
    };
    ($buf:ident, $cmd:expr,[$arg0:expr]) => {{
        $buf[0] = $arg0;
        Ok(($cmd, &$buf[..1]))
    }};
}

impl Command {
    /// Encode into an opcode and argument bytes, the latter written into
    /// `arg_buf`. Arguments outside the range the controller accepts are
    /// rejected before anything reaches the wire.
    pub(crate) fn encode<'a>(self, arg_buf: &'a mut [u8; 1]) -> Result<(u8, &'a [u8]), Error> {
        match self {
            Command::SetSleepMode(ena) => ok_command!(
                arg_buf,
                match ena {
                    true => 0xAE,
                    false => 0xAF,
                },
                []
            ),
            Command::SetContrast(contrast) => ok_command!(arg_buf, 0x81, [contrast]),
            Command::SetInverted(ena) => ok_command!(
                arg_buf,
                match ena {
                    true => 0xA7,
                    false => 0xA6,
                },
                []
            ),
            Command::SetStartLine(line) => match line {
                0..=PIXEL_ROW_MAX => ok_command!(arg_buf, 0x40 | line, []),
                _ => Err(Error::InvalidUsage),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(cmd: Command) -> (u8, Vec<u8>) {
        let mut arg_buf = [0u8; 1];
        let (opcode, args) = cmd.encode(&mut arg_buf).unwrap();
        (opcode, args.to_vec())
    }

    #[test]
    fn init_sequence_bytes() {
        let flat: Vec<(u8, &[u8])> = INIT_SEQUENCE
            .iter()
            .map(|step| (step.opcode, step.args))
            .collect();
        assert_eq!(
            flat,
            vec![
                (0xAE, &[][..]),
                (0xD5, &[][..]),
                (0x50, &[][..]),
                (0xA8, &[0x3F][..]),
                (0xD3, &[0x00][..]),
                (0x40, &[][..]),
                (0xAD, &[0x8B][..]),
                (0xA1, &[][..]),
                (0xC8, &[][..]),
                (0xDA, &[0x12][..]),
                (0x81, &[0x80][..]),
                (0xD9, &[0x22][..]),
                (0xDB, &[0x35][..]),
                (0xA6, &[][..]),
                (0xAF, &[][..]),
            ]
        );
    }

    #[test]
    fn page_cursor_bytes() {
        for page in 0..NUM_PAGES as u8 {
            assert_eq!(page_cursor(page), [0xB0 + page, 0x02, 0x10]);
        }
    }

    #[test]
    fn set_sleep_mode() {
        assert_eq!(encoded(Command::SetSleepMode(true)), (0xAE, vec![]));
        assert_eq!(encoded(Command::SetSleepMode(false)), (0xAF, vec![]));
    }

    #[test]
    fn set_contrast() {
        assert_eq!(encoded(Command::SetContrast(0x80)), (0x81, vec![0x80]));
        assert_eq!(encoded(Command::SetContrast(0)), (0x81, vec![0]));
        assert_eq!(encoded(Command::SetContrast(255)), (0x81, vec![255]));
    }

    #[test]
    fn set_inverted() {
        assert_eq!(encoded(Command::SetInverted(false)), (0xA6, vec![]));
        assert_eq!(encoded(Command::SetInverted(true)), (0xA7, vec![]));
    }

    #[test]
    fn set_start_line() {
        assert_eq!(encoded(Command::SetStartLine(0)), (0x40, vec![]));
        assert_eq!(encoded(Command::SetStartLine(23)), (0x40 | 23, vec![]));
        assert_eq!(encoded(Command::SetStartLine(63)), (0x7F, vec![]));
        let mut arg_buf = [0u8; 1];
        assert_eq!(
            Command::SetStartLine(64).encode(&mut arg_buf),
            Err(Error::InvalidUsage)
        );
    }
}
