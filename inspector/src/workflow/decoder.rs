use std::convert::TryFrom;
use std::fs;
use std::io::ErrorKind;
use thermcore::prelude::{
    FrameDecoder, FrameError, FrameRecord, FrameResult, FrameSource, ThermalFrame,
};

/// Reads frames exported as JSON (`width`, `height`, optional `minTemp`/`maxTemp`,
/// `temperatures`). The source reference is a file path.
#[derive(Debug, Default)]
pub struct JsonFrameDecoder;

impl FrameDecoder for JsonFrameDecoder {
    fn decode(&self, source: &FrameSource) -> FrameResult<ThermalFrame> {
        let contents = fs::read_to_string(&source.reference).map_err(|err| match err.kind() {
            ErrorKind::NotFound => {
                FrameError::Unavailable(format!("{} not found", source.reference))
            }
            _ => FrameError::Unavailable(format!("{}: {}", source.reference, err)),
        })?;
        let mut record: FrameRecord = serde_json::from_str(&contents)
            .map_err(|err| FrameError::Malformed(format!("{}: {}", source.reference, err)))?;
        if record.max_temp.is_none() {
            record.max_temp = source.max_temp_hint;
        }
        ThermalFrame::try_from(record)
    }
}
