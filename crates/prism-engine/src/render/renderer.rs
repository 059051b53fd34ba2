use crate::pipeline::Pipeline;

/// Ordered pipeline list driven once per frame.
///
/// Pipelines are owned exclusively by the renderer from
/// [`add_pipeline`](Renderer::add_pipeline) on; there is no removal, their
/// lifecycle ends with the renderer. The frame loop that calls
/// [`draw`](Renderer::draw) on a cadence lives in the embedding application.
#[derive(Default)]
pub struct Renderer {
    pipelines: Vec<Box<dyn Pipeline>>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pipeline; draws happen in insertion order.
    pub fn add_pipeline(&mut self, pipeline: impl Pipeline + 'static) {
        self.pipelines.push(Box::new(pipeline));
    }

    /// Draws every owned pipeline exactly once, in insertion order,
    /// synchronously.
    pub fn draw(&mut self) {
        for pipeline in &mut self.pipelines {
            pipeline.draw();
        }
    }

    /// Number of owned pipelines.
    #[inline]
    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    /// Records every call it receives into a shared log.
    struct RecordingPipeline {
        name: &'static str,
        calls: Rc<RefCell<Vec<String>>>,
    }

    impl RecordingPipeline {
        fn new(name: &'static str, calls: &Rc<RefCell<Vec<String>>>) -> Self {
            Self {
                name,
                calls: Rc::clone(calls),
            }
        }
    }

    impl Pipeline for RecordingPipeline {
        fn set_vertex_buffer(&mut self, data: &[f32]) {
            self.calls
                .borrow_mut()
                .push(format!("set:{}:{}", self.name, data.len()));
        }

        fn draw(&mut self) {
            self.calls.borrow_mut().push(format!("draw:{}", self.name));
        }
    }

    #[test]
    fn draw_visits_pipelines_in_insertion_order() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut renderer = Renderer::new();
        renderer.add_pipeline(RecordingPipeline::new("a", &calls));
        renderer.add_pipeline(RecordingPipeline::new("b", &calls));
        renderer.add_pipeline(RecordingPipeline::new("c", &calls));

        renderer.draw();

        assert_eq!(*calls.borrow(), vec!["draw:a", "draw:b", "draw:c"]);
    }

    #[test]
    fn draw_visits_each_pipeline_exactly_once_per_call() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut renderer = Renderer::new();
        renderer.add_pipeline(RecordingPipeline::new("a", &calls));

        renderer.draw();
        renderer.draw();

        assert_eq!(*calls.borrow(), vec!["draw:a", "draw:a"]);
    }

    #[test]
    fn draw_on_empty_renderer_is_a_no_op() {
        let mut renderer = Renderer::new();
        assert!(renderer.is_empty());
        renderer.draw();
    }

    #[test]
    fn add_pipeline_takes_ownership_and_grows_the_list() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut renderer = Renderer::new();
        assert_eq!(renderer.len(), 0);

        renderer.add_pipeline(RecordingPipeline::new("a", &calls));
        renderer.add_pipeline(RecordingPipeline::new("b", &calls));
        assert_eq!(renderer.len(), 2);
    }
}
