//! Body geometry and free-fall/track frame conversion
//!
//! Local body frame: the attachment point is the origin, x spans the width
//! (`-w/2..w/2`) and y runs from the feet (0) to the head (`h`). The center
//! of mass sits at `(0, h/2)`.
//!
//! World transform = translate(attachment) · rotate(attachment rotation)
//! · rotate(cm rotation about the center of mass). Only one of the two
//! rotations is meant to be non-zero; the frame conversions move the angle
//! from one to the other while pinning the center of mass in place.

use glam::{DAffine2, DVec2};

use super::state::{Frame, KinematicState};
use crate::consts::FEET_FRACTION;

impl KinematicState {
    /// Center of mass in body coordinates
    #[inline]
    fn local_center(&self) -> DVec2 {
        DVec2::new(0.0, self.height() / 2.0)
    }

    /// Body-to-world transform
    pub fn transform(&self) -> DAffine2 {
        let c = self.local_center();
        DAffine2::from_translation(self.attachment)
            * DAffine2::from_angle(self.attachment_rotation)
            * DAffine2::from_translation(c)
            * DAffine2::from_angle(self.cm_rotation)
            * DAffine2::from_translation(-c)
    }

    pub fn center_of_mass(&self) -> DVec2 {
        // The cm rotation pivots about this point, so it drops out
        self.attachment + DVec2::from_angle(self.attachment_rotation).rotate(self.local_center())
    }

    pub fn x(&self) -> f64 {
        self.center_of_mass().x
    }

    pub fn y(&self) -> f64 {
        self.center_of_mass().y
    }

    fn rect_corners(&self, min: DVec2, max: DVec2) -> [DVec2; 4] {
        let t = self.transform();
        [
            t.transform_point2(DVec2::new(min.x, min.y)),
            t.transform_point2(DVec2::new(max.x, min.y)),
            t.transform_point2(DVec2::new(max.x, max.y)),
            t.transform_point2(DVec2::new(min.x, max.y)),
        ]
    }

    /// World-space outline (feet-left, feet-right, head-right, head-left)
    pub fn shape(&self) -> [DVec2; 4] {
        let hw = self.width() / 2.0;
        self.rect_corners(DVec2::new(-hw, 0.0), DVec2::new(hw, self.height()))
    }

    /// Lower part of the outline, used for landing tests
    pub fn feet_shape(&self) -> [DVec2; 4] {
        let hw = self.width() / 2.0;
        self.rect_corners(
            DVec2::new(-hw, 0.0),
            DVec2::new(hw, self.height() * FEET_FRACTION),
        )
    }

    /// Outline shrunk about its center to `fraction` of each dimension
    pub fn reduced_shape(&self, fraction: f64) -> [DVec2; 4] {
        let scale = (1.0 - fraction) / 2.0;
        let dw = self.width() * scale;
        let dh = self.height() * scale;
        let hw = self.width() / 2.0;
        self.rect_corners(
            DVec2::new(-hw + dw, dh),
            DVec2::new(hw - dw, self.height() - dh),
        )
    }

    pub fn min_y(&self) -> f64 {
        self.shape().iter().map(|p| p.y).fold(f64::INFINITY, f64::min)
    }

    pub fn max_y(&self) -> f64 {
        self.shape().iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max)
    }

    /// Move the orientation into the center-of-mass rotation.
    ///
    /// No-op when already in the free-fall frame. Returns how far the center
    /// of mass moved (ideally zero); a shift beyond the frame tolerance is
    /// logged, never fatal.
    pub fn convert_to_free_fall(&mut self) -> f64 {
        if self.frame == Frame::FreeFall {
            return 0.0;
        }
        self.frame = Frame::FreeFall;
        if self.cm_rotation != 0.0 {
            log::warn!("cm rotation {} discarded entering free fall", self.cm_rotation);
            self.cm_rotation = 0.0;
        }
        let center = self.center_of_mass();
        let angle = self.attachment_rotation;
        self.set_attachment_rotation(0.0);
        self.set_cm_rotation(angle);
        self.pin_center(center)
    }

    /// Move the orientation into the attachment-point rotation.
    ///
    /// Inverse of [`convert_to_free_fall`](Self::convert_to_free_fall).
    pub fn convert_to_track_frame(&mut self) -> f64 {
        if self.frame == Frame::Track {
            return 0.0;
        }
        self.frame = Frame::Track;
        if self.attachment_rotation != 0.0 {
            log::warn!(
                "attachment rotation {} discarded entering track frame",
                self.attachment_rotation
            );
            self.attachment_rotation = 0.0;
        }
        let center = self.center_of_mass();
        let angle = self.cm_rotation;
        self.set_cm_rotation(0.0);
        self.set_attachment_rotation(angle);
        self.pin_center(center)
    }

    /// Convert to the requested frame even if the flag already says so.
    ///
    /// In the target frame already, the whole orientation (both angles
    /// combined) is gathered into the target frame's rotation.
    pub fn force_frame(&mut self, frame: Frame) -> f64 {
        if self.frame != frame {
            return match frame {
                Frame::FreeFall => self.convert_to_free_fall(),
                Frame::Track => self.convert_to_track_frame(),
            };
        }
        let center = self.center_of_mass();
        let angle = self.attachment_rotation + self.cm_rotation;
        match frame {
            Frame::FreeFall => {
                self.set_attachment_rotation(0.0);
                self.set_cm_rotation(angle);
            }
            Frame::Track => {
                self.set_cm_rotation(0.0);
                self.set_attachment_rotation(angle);
            }
        }
        self.pin_center(center)
    }

    fn pin_center(&mut self, center: DVec2) -> f64 {
        let moved = self.center_of_mass();
        self.translate(center - moved);
        let residual = self.center_of_mass().distance(center);
        if residual > self.checks.frame_tolerance {
            log::warn!("frame conversion moved center of mass by {residual}");
        }
        residual
    }
}
