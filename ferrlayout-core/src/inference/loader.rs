use std::sync::OnceLock;

use tracing::*;

use crate::{
    error::{LayoutError, ModelLoadSnafu},
    inference::{
        model::{ModelSource, SharedModel},
        yolo::ModelSpec,
    },
};

/// Resolves the layout model once per process.
///
/// Candidates are tried in order and the first one that loads is kept for
/// the lifetime of the loader. The outcome is cached either way: once every
/// candidate has failed, later calls report the same failure without
/// touching the candidates again.
pub struct ModelLoader {
    candidates: Vec<Box<dyn ModelSource>>,
    model: OnceLock<Result<SharedModel, Vec<String>>>,
}

impl ModelLoader {
    pub fn new(candidates: Vec<Box<dyn ModelSource>>) -> Self {
        Self {
            candidates,
            model: OnceLock::new(),
        }
    }

    pub fn from_specs(specs: Vec<ModelSpec>) -> Self {
        Self::new(
            specs
                .into_iter()
                .map(|spec| Box::new(spec) as Box<dyn ModelSource>)
                .collect(),
        )
    }

    /// Returns the shared model, loading it on first use.
    ///
    /// Concurrent first callers block on the same initialization.
    pub fn get_model(&self) -> Result<SharedModel, LayoutError> {
        match self.model.get_or_init(|| self.load_first()) {
            Ok(model) => Ok(model.clone()),
            Err(attempts) => ModelLoadSnafu {
                attempts: attempts.clone(),
            }
            .fail(),
        }
    }

    /// Name of the loaded model, `None` before loading or after a failure.
    pub fn loaded(&self) -> Option<&str> {
        match self.model.get() {
            Some(Ok(model)) => Some(model.name()),
            _ => None,
        }
    }

    pub fn candidate_names(&self) -> Vec<&str> {
        self.candidates.iter().map(|c| c.name()).collect()
    }

    fn load_first(&self) -> Result<SharedModel, Vec<String>> {
        let mut attempts = Vec::with_capacity(self.candidates.len());

        for candidate in &self.candidates {
            info!("Trying to load layout model `{}`", candidate.name());
            match candidate.load() {
                Ok(model) => {
                    info!("Layout model `{}` loaded", candidate.name());
                    return Ok(model);
                }
                Err(err) => {
                    warn!("Error loading layout model `{}`: {}", candidate.name(), err);
                    attempts.push(format!("{}: {}", candidate.name(), err));
                }
            }
        }

        if attempts.is_empty() {
            attempts.push("no model candidates configured".to_string());
        }
        error!("Failed to load any layout model");
        Err(attempts)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use image::RgbImage;

    use super::*;
    use crate::{
        error::ProcessingSnafu,
        inference::model::{LayoutModel, ModelOutput},
        layout::element::RawDetection,
    };

    struct NamedModel(String);

    impl LayoutModel for NamedModel {
        fn name(&self) -> &str {
            &self.0
        }

        fn detect_with_response(&self, _image: &RgbImage) -> Result<ModelOutput, LayoutError> {
            Ok(ModelOutput::Blocks(Vec::new()))
        }

        fn detect(&self, _image: &RgbImage) -> Result<Vec<RawDetection>, LayoutError> {
            Ok(Vec::new())
        }
    }

    struct CountingSource {
        name: &'static str,
        succeed: bool,
        loads: Arc<AtomicUsize>,
    }

    impl CountingSource {
        fn boxed(name: &'static str, succeed: bool, loads: &Arc<AtomicUsize>) -> Box<dyn ModelSource> {
            Box::new(Self {
                name,
                succeed,
                loads: loads.clone(),
            })
        }
    }

    impl ModelSource for CountingSource {
        fn name(&self) -> &str {
            self.name
        }

        fn load(&self) -> Result<SharedModel, LayoutError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.succeed {
                Ok(Arc::new(NamedModel(self.name.to_string())))
            } else {
                ProcessingSnafu {
                    message: format!("{} is broken", self.name),
                }
                .fail()
            }
        }
    }

    #[test]
    fn test_first_working_candidate_wins() {
        let broken = Arc::new(AtomicUsize::new(0));
        let good = Arc::new(AtomicUsize::new(0));
        let spare = Arc::new(AtomicUsize::new(0));
        let loader = ModelLoader::new(vec![
            CountingSource::boxed("broken", false, &broken),
            CountingSource::boxed("good", true, &good),
            CountingSource::boxed("spare", true, &spare),
        ]);

        assert_eq!(loader.loaded(), None);
        let model = loader.get_model().unwrap();
        assert_eq!(model.name(), "good");
        assert_eq!(loader.loaded(), Some("good"));
        assert_eq!(broken.load(Ordering::SeqCst), 1);
        assert_eq!(good.load(Ordering::SeqCst), 1);
        assert_eq!(spare.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_model_is_loaded_once() {
        let loads = Arc::new(AtomicUsize::new(0));
        let loader = ModelLoader::new(vec![CountingSource::boxed("good", true, &loads)]);

        let first = loader.get_model().unwrap();
        let second = loader.get_model().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_first_access_loads_once() {
        let loads = Arc::new(AtomicUsize::new(0));
        let loader = ModelLoader::new(vec![CountingSource::boxed("good", true, &loads)]);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    assert_eq!(loader.get_model().unwrap().name(), "good");
                });
            }
        });

        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failure_is_cached() {
        let a = Arc::new(AtomicUsize::new(0));
        let b = Arc::new(AtomicUsize::new(0));
        let loader = ModelLoader::new(vec![
            CountingSource::boxed("a", false, &a),
            CountingSource::boxed("b", false, &b),
        ]);

        for _ in 0..3 {
            match loader.get_model() {
                Err(LayoutError::ModelLoad { attempts }) => {
                    assert_eq!(attempts.len(), 2);
                    assert!(attempts[0].starts_with("a: "));
                    assert!(attempts[1].contains("b is broken"));
                }
                other => panic!("expected model load failure, got {:?}", other.map(|m| m.name().to_string())),
            }
        }
        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 1);
        assert_eq!(loader.loaded(), None);
    }

    #[test]
    fn test_empty_candidate_list_fails() {
        let loader = ModelLoader::new(Vec::new());
        let err = loader.get_model().err().unwrap();
        assert!(err.to_string().contains("no model candidates configured"));
    }

    #[test]
    fn test_missing_model_files_fail() {
        let loader = ModelLoader::from_specs(ModelSpec::defaults(std::path::Path::new(
            "/nonexistent/models",
        )));
        assert_eq!(
            loader.candidate_names(),
            vec!["yolov12s-doclaynet", "yolov8-publaynet"]
        );
        assert!(matches!(
            loader.get_model(),
            Err(LayoutError::ModelLoad { .. })
        ));
    }
}
