use std::sync::Arc;

/// Magic bytes every moc blob starts with.
pub const MOC_MAGIC: &[u8; 4] = b"MOC3";
/// Size of the moc header.
pub const MOC_HEADER_SIZE: usize = 64;
/// Newest moc format version this crate knows about.
pub const MOC_LATEST_VERSION: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MocError {
	#[error("Moc blob is {0} bytes, smaller than its header")]
	TooSmall(usize),
	#[error("Moc blob does not start with MOC3")]
	BadMagic,
	#[error("Unsupported moc version {0}")]
	UnsupportedVersion(u8),
	#[error("Moc blob is malformed: {0}")]
	Malformed(String),
}

/// Deformable mesh blob, validated but otherwise opaque. A [`MocLoader`](crate::instance::MocLoader) interprets it.
#[derive(Clone, Debug)]
pub struct Moc {
	version: u8,
	data: Arc<[u8]>,
}

impl Moc {
	pub fn parse(data: impl Into<Arc<[u8]>>) -> Result<Self, MocError> {
		let data = data.into();

		if data.len() < MOC_HEADER_SIZE {
			return Err(MocError::TooSmall(data.len()));
		}
		if &data[..4] != MOC_MAGIC {
			return Err(MocError::BadMagic);
		}

		let version = data[4];
		if version == 0 || version > MOC_LATEST_VERSION {
			return Err(MocError::UnsupportedVersion(version));
		}

		Ok(Self { version, data })
	}

	pub fn version(&self) -> u8 {
		self.version
	}

	pub fn data(&self) -> &[u8] {
		&self.data
	}
}
