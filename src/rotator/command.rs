/// One rotator command: an ASCII verb plus optional numeric argument.
///
/// Angle arguments carry the value that goes on the wire; the horizontal
/// sign inversion is applied by the client before constructing the command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Version,
    GetPosition,
    SetVertical(f64),
    SetHorizontal(f64),
    CalibrateVertical { set: bool },
    CalibrateHorizontal,
    MoveVertical(i64),
    MoveHorizontal(i64),
}

impl Command {
    /// The command line as sent, without the trailing newline.
    ///
    /// Angles use `{:?}` so whole degrees keep a trailing `.0` on the wire
    /// (`DHOR 45.0`, never `DHOR 45`).
    pub fn wire_line(&self) -> String {
        match self {
            Command::Version => "VERS".into(),
            Command::GetPosition => "GETP".into(),
            Command::SetVertical(deg) => format!("DVER {deg:?}"),
            Command::SetHorizontal(deg) => format!("DHOR {deg:?}"),
            Command::CalibrateVertical { set: false } => "CALV".into(),
            Command::CalibrateVertical { set: true } => "CALV SET".into(),
            Command::CalibrateHorizontal => "CALH".into(),
            Command::MoveVertical(steps) => format!("MOVV {steps}"),
            Command::MoveHorizontal(steps) => format!("MOVH {steps}"),
        }
    }

    /// Exact number of trailing fields a successful response must carry, or
    /// `None` when the command does not constrain the count.
    pub fn expected_fields(&self) -> Option<usize> {
        match self {
            Command::Version => Some(1),
            Command::GetPosition => Some(2),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_lines_match_the_grammar() {
        assert_eq!(Command::Version.wire_line(), "VERS");
        assert_eq!(Command::GetPosition.wire_line(), "GETP");
        assert_eq!(Command::SetVertical(12.5).wire_line(), "DVER 12.5");
        assert_eq!(Command::SetHorizontal(45.0).wire_line(), "DHOR 45.0");
        assert_eq!(
            Command::CalibrateVertical { set: false }.wire_line(),
            "CALV"
        );
        assert_eq!(
            Command::CalibrateVertical { set: true }.wire_line(),
            "CALV SET"
        );
        assert_eq!(Command::CalibrateHorizontal.wire_line(), "CALH");
        assert_eq!(Command::MoveVertical(-200).wire_line(), "MOVV -200");
        assert_eq!(Command::MoveHorizontal(64).wire_line(), "MOVH 64");
    }

    #[test]
    fn whole_degrees_keep_a_decimal_point() {
        assert_eq!(Command::SetVertical(-7.0).wire_line(), "DVER -7.0");
    }
}
