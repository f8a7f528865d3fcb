pub mod facade;
pub mod index;
pub mod resolver;
pub mod usages;
pub mod views;
pub mod walker;

pub use facade::ProtoIndexer;
pub use index::{EntityRef, IndexStats, Indexed, SearchEntry, SymbolIndex};
pub use resolver::{ResolvedDefinition, TypeResolver};
pub use usages::{TypeUsage, UsageContext, UsageFinder};
pub use views::{EnumValueView, EnumView, FieldView, MessageView, RpcView, ServiceView};
pub use walker::FileWalker;
