// Prediction pipeline modules and shared errors
pub mod artifact_store {
    pub use crate::artifact_store::*;
}

pub mod features {
    pub use crate::features::*;
}

pub mod preprocessing {
    pub use crate::preprocessing::*;
}

pub mod regressor {
    pub use crate::regressor::*;
}

pub mod inference {
    pub use crate::inference::*;
}

pub mod errors {
    pub use crate::errors::*;
}
