//! WGSL sources for the scene and post-process passes.

/// Lit, instanced mesh pass. Swimmers get a tail sway driven by their
/// animation phase.
pub const SCENE_SHADER: &str = r#"
struct Scene {
    view_proj: mat4x4<f32>,
    // w: elapsed seconds
    camera_pos: vec4<f32>,
    ambient: vec4<f32>,
    directional_color: vec4<f32>,
    // xyz: direction toward the light
    directional_dir: vec4<f32>,
    spot_color: vec4<f32>,
    // w: range
    spot_position: vec4<f32>,
    // x: cos outer, y: cos inner, z: decay
    spot_cone: vec4<f32>,
    background: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> scene: Scene;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    // w: tail sway amplitude
    @location(6) tint: vec4<f32>,
    // x: swim phase
    @location(7) anim: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) tint: vec3<f32>,
};

@vertex
fn vs_main(v: VertexInput, inst: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(inst.model_0, inst.model_1, inst.model_2, inst.model_3);

    var p = v.position;
    let behind = max(p.z, 0.0);
    p.x = p.x + sin(inst.anim.x - p.z * 2.5) * inst.tint.w * behind;

    let world_pos = model * vec4<f32>(p, 1.0);

    var out: VertexOutput;
    out.clip_position = scene.view_proj * world_pos;
    out.world_position = world_pos.xyz;
    out.normal = normalize((model * vec4<f32>(v.normal, 0.0)).xyz);
    out.tint = inst.tint.rgb;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let n = normalize(in.normal);
    var light = scene.ambient.rgb;

    let sun = normalize(scene.directional_dir.xyz);
    light = light + scene.directional_color.rgb * max(dot(n, sun), 0.0);

    let to_spot = scene.spot_position.xyz - in.world_position;
    let dist = length(to_spot);
    let l = to_spot / max(dist, 0.0001);
    let cos_angle = dot(-l, vec3<f32>(0.0, -1.0, 0.0));
    let cone = smoothstep(scene.spot_cone.x, scene.spot_cone.y, cos_angle);
    let falloff = pow(clamp(1.0 - dist / scene.spot_position.w, 0.0, 1.0), scene.spot_cone.z);
    light = light + scene.spot_color.rgb * max(dot(n, l), 0.0) * cone * falloff;

    var color = in.tint * light;

    // Haze toward the water colour with distance.
    let view_dist = length(scene.camera_pos.xyz - in.world_position);
    let haze = clamp((view_dist - 60.0) / 200.0, 0.0, 0.6);
    color = mix(color, scene.background.rgb, haze);

    return vec4<f32>(color, 1.0);
}
"#;

/// Fullscreen bloom and vignette over the offscreen scene texture.
pub const POST_SHADER: &str = r#"
struct Post {
    // x: strength, y: threshold, z: radius, w: vignette
    bloom: vec4<f32>,
    // xy: 1 / target size
    texel: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@group(0) @binding(0)
var scene: texture_2d<f32>;
@group(0) @binding(1)
var scene_sampler: sampler;
@group(0) @binding(2)
var<uniform> post: Post;

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    var positions = array<vec2<f32>, 3>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(3.0, -1.0),
        vec2<f32>(-1.0, 3.0),
    );
    var uvs = array<vec2<f32>, 3>(
        vec2<f32>(0.0, 1.0),
        vec2<f32>(2.0, 1.0),
        vec2<f32>(0.0, -1.0),
    );

    var out: VertexOutput;
    out.clip_position = vec4<f32>(positions[vertex_index], 0.0, 1.0);
    out.uv = uvs[vertex_index];
    return out;
}

fn bright(c: vec3<f32>) -> vec3<f32> {
    let luma = dot(c, vec3<f32>(0.2126, 0.7152, 0.0722));
    return c * smoothstep(post.bloom.y, post.bloom.y + 0.1, luma);
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let base = textureSampleLevel(scene, scene_sampler, in.uv, 0.0).rgb;

    // Two rings of twelve taps over the bright parts.
    var glow = vec3<f32>(0.0);
    let reach = post.bloom.z * 24.0;
    for (var i = 0; i < 12; i = i + 1) {
        let angle = f32(i) * 0.5235988;
        let dir = vec2<f32>(cos(angle), sin(angle)) * post.texel.xy * reach;
        glow = glow + bright(textureSampleLevel(scene, scene_sampler, in.uv + dir * 0.5, 0.0).rgb);
        glow = glow + bright(textureSampleLevel(scene, scene_sampler, in.uv + dir, 0.0).rgb);
    }
    var color = base + glow / 24.0 * post.bloom.x;

    let d = distance(in.uv, vec2<f32>(0.5, 0.5));
    color = color * (1.0 - post.bloom.w * smoothstep(0.3, 0.8, d));

    return vec4<f32>(color, 1.0);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    /// Validates WGSL code using naga.
    fn validate_wgsl(code: &str) -> Result<(), String> {
        let module = naga::front::wgsl::parse_str(code)
            .map_err(|e| format!("WGSL parse error: {:?}", e))?;

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator
            .validate(&module)
            .map_err(|e| format!("WGSL validation error: {:?}", e))?;

        Ok(())
    }

    #[test]
    fn test_scene_shader_validates() {
        validate_wgsl(SCENE_SHADER).unwrap();
    }

    #[test]
    fn test_post_shader_validates() {
        validate_wgsl(POST_SHADER).unwrap();
    }
}
