use crate::geo::{HeadingSensor, OrientationCapability};

/// Heading supplied on the command line.
///
/// A terminal has no magnetometer, so without `--heading` the sensor reports
/// itself unsupported and the compass shows the bearing from true north.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedHeading {
    heading: Option<f64>,
}

impl FixedHeading {
    pub fn new(heading: Option<f64>) -> Self {
        Self { heading }
    }
}

impl HeadingSensor for FixedHeading {
    fn request_permission(&mut self) -> OrientationCapability {
        match self.heading {
            Some(_) => OrientationCapability::Granted,
            None => OrientationCapability::Unsupported,
        }
    }

    fn heading(&mut self) -> Option<f64> {
        self.heading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_heading_capability() {
        let mut none = FixedHeading::default();
        assert_eq!(none.request_permission(), OrientationCapability::Unsupported);
        assert_eq!(none.heading(), None);

        let mut east = FixedHeading::new(Some(90.0));
        assert_eq!(east.request_permission(), OrientationCapability::Granted);
        assert_eq!(east.heading(), Some(90.0));
    }
}
