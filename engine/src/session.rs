use tracing::{debug, info, warn};

use crate::engine::{EngineError, EngineResult, Frame, Operation, RecognitionEngine};

/// 引擎会话
///
/// 持有引擎的独占借用, 创建时初始化引擎, `finish` 或析构时释放引擎,
/// 同一引擎同一时间至多存在一个会话.
pub struct EngineSession<'a> {
    engine: &'a mut dyn RecognitionEngine,
    active: bool,
}

impl<'a> EngineSession<'a> {
    /// 初始化引擎并创建会话, 初始化失败时不会调用释放
    ///
    /// # 参数
    ///
    /// * `engine` - 识别引擎
    /// * `config` - JSON 格式的引擎配置
    pub fn start(
        engine: &'a mut dyn RecognitionEngine,
        config: &str,
    ) -> Result<Self, EngineError> {
        debug!("引擎配置: {}", config);
        let result = engine.initialize(config).check(Operation::Initialize)?;
        info!("引擎初始化成功 {}", result.json);
        Ok(Self {
            engine,
            active: true,
        })
    }

    /// 识别一帧图像
    ///
    /// # 参数
    ///
    /// * `frame` - 待识别的图像
    pub fn process(&mut self, frame: &Frame) -> Result<EngineResult, EngineError> {
        debug!(
            "识别图像: {} {}x{}, 行跨度: {}, 方向: {}",
            frame.image_type, frame.width, frame.height, frame.stride, frame.orientation
        );
        self.engine.process(frame).check(Operation::Process)
    }

    /// 释放引擎并结束会话
    pub fn finish(mut self) -> Result<EngineResult, EngineError> {
        self.active = false;
        let result = self.engine.shutdown().check(Operation::Shutdown)?;
        info!("引擎已释放");
        Ok(result)
    }
}

impl Drop for EngineSession<'_> {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        let result = self.engine.shutdown();
        if result.is_success() {
            debug!("会话未正常结束, 引擎已释放");
        } else {
            warn!("会话析构时释放引擎失败: {}", result.payload());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ImageType;

    #[derive(Default)]
    struct CountingEngine {
        calls: Vec<&'static str>,
        fail_initialize: bool,
        fail_shutdown: bool,
    }

    impl RecognitionEngine for CountingEngine {
        fn initialize(&mut self, _config: &str) -> EngineResult {
            self.calls.push("initialize");
            if self.fail_initialize {
                EngineResult::failure(1, "Failed", "{\"error\":\"init\"}")
            } else {
                EngineResult::ok("")
            }
        }

        fn process(&mut self, _frame: &Frame) -> EngineResult {
            self.calls.push("process");
            EngineResult::ok("{\"plates\":[]}")
        }

        fn shutdown(&mut self) -> EngineResult {
            self.calls.push("shutdown");
            if self.fail_shutdown {
                EngineResult::failure(1, "Failed", "")
            } else {
                EngineResult::ok("")
            }
        }
    }

    fn frame(buffer: &[u8]) -> Frame<'_> {
        Frame {
            image_type: ImageType::Y,
            buffer,
            width: 2,
            height: 2,
            stride: 2,
            orientation: 1,
        }
    }

    #[test]
    fn test_session_finish() {
        let mut engine = CountingEngine::default();
        let buffer = [0u8; 4];
        let mut session = EngineSession::start(&mut engine, "{}").unwrap();
        let result = session.process(&frame(&buffer)).unwrap();
        assert_eq!(result.json, "{\"plates\":[]}");
        session.finish().unwrap();
        assert_eq!(engine.calls, vec!["initialize", "process", "shutdown"]);
    }

    #[test]
    fn test_session_drop_shuts_down_once() {
        let mut engine = CountingEngine::default();
        {
            let _session = EngineSession::start(&mut engine, "{}").unwrap();
        }
        assert_eq!(engine.calls, vec!["initialize", "shutdown"]);
    }

    #[test]
    fn test_session_initialize_failure() {
        let mut engine = CountingEngine {
            fail_initialize: true,
            ..Default::default()
        };
        let error = EngineSession::start(&mut engine, "{}").err().unwrap();
        assert_eq!(error.operation, Operation::Initialize);
        assert_eq!(error.payload, "{\"error\":\"init\"}");
        assert_eq!(engine.calls, vec!["initialize"]);
    }

    #[test]
    fn test_session_shutdown_failure() {
        let mut engine = CountingEngine {
            fail_shutdown: true,
            ..Default::default()
        };
        let session = EngineSession::start(&mut engine, "{}").unwrap();
        let error = session.finish().unwrap_err();
        assert_eq!(error.operation, Operation::Shutdown);
        assert_eq!(engine.calls, vec!["initialize", "shutdown"]);
    }
}
