use sidewinder_assets::ShaderPair;

/// Supplies the shader text handed to the module initializer.
pub trait ShaderProvider {
    fn shaders(&self) -> ShaderPair;
}

impl ShaderProvider for ShaderPair {
    fn shaders(&self) -> ShaderPair {
        self.clone()
    }
}

/// Shader text compiled into the host binary, typically via `include_str!`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct EmbeddedShaders {
    pub vertex: &'static str,
    pub fragment: &'static str,
}

impl EmbeddedShaders {
    pub const fn new(vertex: &'static str, fragment: &'static str) -> Self {
        Self { vertex, fragment }
    }
}

impl ShaderProvider for EmbeddedShaders {
    fn shaders(&self) -> ShaderPair {
        ShaderPair::from_text(self.vertex, self.fragment)
    }
}
