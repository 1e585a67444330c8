use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};

/// Location of one rendered unit cube, centred on an occupied cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub cell: glm::IVec3,
    pub center: glm::Vec3,
    pub scale: glm::Vec3,
}

impl Placement {
    pub fn model_matrix(&self) -> glm::Mat4 {
        glm::translation(&self.center) * glm::scaling(&self.scale)
    }
}

/// Receives the final placements, e.g. to upload them as per instance data.
pub trait InstanceSink {
    fn upload(&mut self, placements: &[Placement]) -> anyhow::Result<()>;
}

/// Keeps a copy of every upload.
impl InstanceSink for Vec<Vec<Placement>> {
    fn upload(&mut self, placements: &[Placement]) -> anyhow::Result<()> {
        self.push(placements.to_vec());
        Ok(())
    }
}
