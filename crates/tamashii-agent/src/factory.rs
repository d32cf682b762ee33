//! Component construction.

use tamashii_hardware::devices::{AnyBuzzerDevice, AnyRfidDevice};

use crate::any::AnyComponent;
use crate::component::{Component, ComponentKind, ComponentSpec, EventSender};
use crate::components::{Buzzer, CardReader, Connection};
use crate::{AgentError, Result};

/// Builds components for the master.
///
/// The master calls [`build`](Self::build) once per spec, in construction
/// order, and starts the result itself.
pub trait ComponentFactory {
    type Component: Component;

    /// Build (but do not start) the component described by `spec`.
    ///
    /// `events` is the submission channel back to the master.
    fn build(&mut self, spec: ComponentSpec, events: EventSender) -> Result<Self::Component>;
}

/// Factory wiring components to hardware devices.
///
/// Each device is handed to exactly one component.
#[derive(Debug)]
pub struct HardwareFactory {
    rfid: Option<AnyRfidDevice>,
    buzzer: Option<AnyBuzzerDevice>,
}

impl HardwareFactory {
    pub fn new(rfid: AnyRfidDevice, buzzer: AnyBuzzerDevice) -> Self {
        Self {
            rfid: Some(rfid),
            buzzer: Some(buzzer),
        }
    }

    fn device_taken(kind: ComponentKind) -> AgentError {
        AgentError::component(kind, "device already assigned to another component")
    }
}

impl ComponentFactory for HardwareFactory {
    type Component = AnyComponent;

    fn build(&mut self, spec: ComponentSpec, events: EventSender) -> Result<AnyComponent> {
        let kind = spec.kind();
        let component: AnyComponent = match spec {
            ComponentSpec::Connection(config) => Connection::new(config, events).into(),
            ComponentSpec::Buzzer(config) => {
                let device = self.buzzer.take().ok_or_else(|| Self::device_taken(kind))?;
                Buzzer::new(device, config).into()
            }
            ComponentSpec::CardReader(config) => {
                let device = self.rfid.take().ok_or_else(|| Self::device_taken(kind))?;
                CardReader::new(device, events, config).into()
            }
        };
        Ok(component)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::event_channel;
    use crate::components::{BuzzerConfig, CardReaderConfig, ConnectionConfig};
    use tamashii_hardware::mock::{MockBuzzer, MockRfid};

    fn factory() -> HardwareFactory {
        let (rfid, _) = MockRfid::new();
        let (buzzer, _) = MockBuzzer::new();
        HardwareFactory::new(AnyRfidDevice::Mock(rfid), AnyBuzzerDevice::Mock(buzzer))
    }

    #[test]
    fn test_builds_each_kind() {
        let mut factory = factory();
        let (events, _rx) = event_channel(4);

        let specs = [
            ComponentSpec::Connection(ConnectionConfig::default()),
            ComponentSpec::Buzzer(BuzzerConfig::default()),
            ComponentSpec::CardReader(CardReaderConfig::default()),
        ];
        for spec in specs {
            let expected = spec.kind();
            let component = factory.build(spec, events.clone()).unwrap();
            assert_eq!(component.kind(), expected);
        }
    }

    #[test]
    fn test_device_handed_out_once() {
        let mut factory = factory();
        let (events, _rx) = event_channel(4);

        factory
            .build(ComponentSpec::Buzzer(BuzzerConfig::default()), events.clone())
            .unwrap();
        let second = factory.build(ComponentSpec::Buzzer(BuzzerConfig::default()), events);
        assert!(matches!(
            second,
            Err(AgentError::Component {
                component: ComponentKind::Buzzer,
                ..
            })
        ));
    }
}
