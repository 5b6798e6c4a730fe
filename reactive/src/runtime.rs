use std::{
    panic::Location,
    sync::OnceLock,
    thread::{self, ThreadId},
};

struct UiThread {
    id: ThreadId,
    location: &'static Location<'static>,
}

static UI_THREAD: OnceLock<UiThread> = OnceLock::new();

/// Thread-affinity bookkeeping for the single-threaded UI loop.
///
/// Every binding, chain subscription and collection sync runs on the thread
/// that drives the host's update loop. The runtime remembers that thread the
/// first time [`Runtime::init_on_ui_thread`] is called and lets the binding
/// engine assert it afterwards. Until a UI thread is registered every thread
/// is accepted.
pub struct Runtime;

impl Runtime {
    /// Register the calling thread as the UI thread.
    ///
    /// Later calls from the same thread are no-ops. Calling it from a second
    /// thread keeps the first registration.
    #[track_caller]
    pub fn init_on_ui_thread() {
        let location = Location::caller();
        let _ = UI_THREAD.get_or_init(|| UiThread {
            id: thread::current().id(),
            location,
        });
    }

    /// Whether the calling thread may touch binding state.
    pub fn is_ui_thread() -> bool {
        UI_THREAD
            .get()
            .is_none_or(|ui| ui.id == thread::current().id())
    }

    /// Panic (debug builds only) when called off the registered UI thread.
    #[track_caller]
    pub fn assert_ui_thread() {
        #[cfg(debug_assertions)]
        if let Some(ui) = UI_THREAD.get() {
            if ui.id != thread::current().id() {
                let caller = Location::caller();
                panic!(
                    "Unsync runtime access from non-UI thread {:?} (caller: {}:{}); \
                     UI thread set at {}:{}",
                    thread::current().id(),
                    caller.file(),
                    caller.line(),
                    ui.location.file(),
                    ui.location.line(),
                );
            }
        }
    }
}
