use bitflags::bitflags;

bitflags! {
    /// IEEE 488.2 Standard Event Status Register, as returned by `*ESR?`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EventStatus: u8 {
        const OperationComplete  = 1<<0;
        const RequestControl     = 1<<1;
        const QueryError         = 1<<2;
        const DeviceError        = 1<<3;
        const ExecutionError     = 1<<4;
        const CommandError       = 1<<5;
        const UserRequest        = 1<<6;
        const PowerOn            = 1<<7;
    }
}

impl EventStatus {
    pub const ERRORS: EventStatus = EventStatus::QueryError
        .union(EventStatus::DeviceError)
        .union(EventStatus::ExecutionError)
        .union(EventStatus::CommandError);

    pub fn errors(self) -> EventStatus {
        self.intersection(Self::ERRORS)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_errors() {
        let status = EventStatus::from_bits_retain(0b1010_0001);
        assert_eq!(status.errors(), EventStatus::CommandError);
        assert!(EventStatus::OperationComplete.errors().is_empty());
        assert_eq!(EventStatus::all().errors(), EventStatus::ERRORS);
    }
}
