pub mod cache;
pub mod closure;
pub mod feed;
pub mod invocation;
pub mod process;
pub mod steps;
pub mod strategy;
pub mod stream;
pub mod table;

pub use cache::FrameCache;
pub use closure::StateClosure;
pub use feed::FeedManifold;
pub use invocation::Invocation;
pub use process::RenderProcess;
pub use steps::Step;
pub use strategy::{OutputAlloc, Strategy};
pub use stream::{render_concurrently, CalcStream};
pub use table::{BuffTableStorage, BufferTable};
