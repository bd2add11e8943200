mod error;
pub use error::{ExecError, ExecResult};

pub mod parallel;
pub use parallel::{Parallel, ParallelConfig, ParallelError, scope};

pub mod node;
pub use node::{LocalNode, Node, SshNode};

mod fanout;
pub use fanout::{NodeOutput, exec_on_nodes};

mod util;

pub mod prelude {
    pub use crate::error::{ExecError, ExecResult};
    pub use crate::fanout::{NodeOutput, exec_on_nodes};
    pub use crate::node::{LocalNode, Node, SshNode};
    pub use crate::parallel::{Parallel, ParallelConfig, ParallelError};
}
