//! 识别结果的输出：路径规划与 CSV/JSON 序列化。

pub mod report;
