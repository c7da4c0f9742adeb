//! HCI event packets

/// A validated view of one inbound HCI event.
///
/// The radio delivers `[code, parameter_length, parameters...]`. The
/// engine reads event fields at fixed offsets, so a packet carrying
/// fewer parameter bytes than its length byte claims is rejected here
/// before any field extraction.
#[derive(Debug, Clone, Copy)]
pub struct HciEvent<'a> {
    code: u8,
    parameters: &'a [u8],
}

impl<'a> HciEvent<'a> {
    /// Checks the two-byte header against the delivered length and
    /// borrows the parameter bytes. Bytes past the declared length are
    /// not parameters and are dropped from the view.
    pub fn parse(packet: &'a [u8]) -> Option<Self> {
        let (&code, rest) = packet.split_first()?;
        let (&len, parameters) = rest.split_first()?;
        if parameters.len() < len as usize {
            return None;
        }
        Some(Self {
            code,
            parameters: &parameters[..len as usize],
        })
    }

    pub fn code(&self) -> u8 {
        self.code
    }

    pub fn parameters(&self) -> &'a [u8] {
        self.parameters
    }

    /// The status byte, for the event families that lead with one.
    pub fn status(&self) -> Option<u8> {
        self.parameters.first().copied()
    }
}
