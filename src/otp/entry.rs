pub const OTP_LENGTH: usize = 4;

/// Per-digit code entry: one box per digit plus the box that holds focus.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OtpEntry {
    digits: [Option<char>; OTP_LENGTH],
    focus: usize,
}

impl OtpEntry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn digits(&self) -> [Option<char>; OTP_LENGTH] {
        self.digits
    }

    /// Handles text arriving in box `index`. Non-digits are dropped. Several
    /// digits (a paste) fill forward from `index`; a single key keeps its
    /// last digit and advances focus.
    pub fn handle_change(&mut self, index: usize, value: &str) {
        if index >= OTP_LENGTH {
            return;
        }
        let clean: Vec<char> = value.chars().filter(|c| c.is_ascii_digit()).collect();

        if clean.len() > 1 {
            for (slot, ch) in self.digits[index..].iter_mut().zip(clean.iter()) {
                *slot = Some(*ch);
            }
            self.focus = self
                .digits
                .iter()
                .position(Option::is_none)
                .unwrap_or(OTP_LENGTH - 1);
            return;
        }

        self.digits[index] = clean.last().copied();
        if self.digits[index].is_some() && index < OTP_LENGTH - 1 {
            self.focus = index + 1;
        } else {
            self.focus = index;
        }
    }

    /// Backspace over an empty box moves focus to the previous one.
    pub fn handle_backspace(&mut self, index: usize) {
        if index >= OTP_LENGTH {
            return;
        }
        if self.digits[index].is_none() && index > 0 {
            self.focus = index - 1;
        }
    }

    pub fn code(&self) -> String {
        self.digits.iter().flatten().collect()
    }

    pub fn is_complete(&self) -> bool {
        self.digits.iter().all(Option::is_some)
    }

    /// Clears every box and focuses the first.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
