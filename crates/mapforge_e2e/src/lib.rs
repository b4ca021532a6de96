//! Generated mappers over a small compiled domain.
//!
//! `app` holds the compiled types the fixtures map from. The build script compiles the fixtures into a
//! `mappers` module that imports them through `crate::app`.

pub mod app {
    pub mod entities {
        #[derive(Debug, Clone, PartialEq, Default, mapforge_runtime::Reflect)]
        pub struct User {
            pub name: String,
            pub username: String,
        }
    }
}

include!(concat!(env!("OUT_DIR"), "/mappers.rs"));
