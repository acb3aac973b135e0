//! 工具位姿类型
//!
//! 回放器以「当前位姿 + 记录增量」的方式计算绝对目标位姿，
//! 运动学模型本身由外部 SDK 负责，这里只携带笛卡尔坐标值。

/// 工具位姿（笛卡尔坐标 + 欧拉角，单位：米 / 度）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ToolPose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub theta_x: f64,
    pub theta_y: f64,
    pub theta_z: f64,
}

impl ToolPose {
    /// 计算绝对目标位姿 = 当前位姿 + 位置增量 + 姿态增量
    ///
    /// 增量为全零时返回当前位姿本身（恒等变换）。
    pub fn apply_delta(&self, world_vector: &[f64; 3], rotation_delta: &[f64; 3]) -> ToolPose {
        ToolPose {
            x: self.x + world_vector[0],
            y: self.y + world_vector[1],
            z: self.z + world_vector[2],
            theta_x: self.theta_x + rotation_delta[0],
            theta_y: self.theta_y + rotation_delta[1],
            theta_z: self.theta_z + rotation_delta[2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_delta() {
        let pose = ToolPose {
            x: 0.5,
            y: 0.2,
            z: 0.4,
            theta_x: 90.0,
            theta_y: 0.0,
            theta_z: 45.0,
        };

        let target = pose.apply_delta(&[0.0, -0.1, -0.2], &[0.0, 10.0, 0.0]);

        assert_eq!(target.x, 0.5);
        assert!((target.y - 0.1).abs() < 1e-12);
        assert!((target.z - 0.2).abs() < 1e-12);
        assert_eq!(target.theta_x, 90.0);
        assert_eq!(target.theta_y, 10.0);
        assert_eq!(target.theta_z, 45.0);
    }

    #[test]
    fn test_apply_delta_identity() {
        let pose = ToolPose {
            x: 1.0,
            y: 2.0,
            z: 3.0,
            ..Default::default()
        };

        // 全零增量 = 恒等变换
        let target = pose.apply_delta(&[0.0; 3], &[0.0; 3]);
        assert_eq!(target, pose);
    }
}
