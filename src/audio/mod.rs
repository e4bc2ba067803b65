pub mod beat;
pub mod decode;
pub mod features;
pub mod stft;
