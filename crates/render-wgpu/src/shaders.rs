/// WGSL shader for the terrain tiles and the car.
///
/// Both are instanced: the model matrix and base color come per instance.
/// Lighting is a hemisphere fill plus an optional spot light, followed by
/// Reinhard tone mapping and fog over the eye distance (fog is applied after
/// tone mapping).
pub const SCENE_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    // eye position, w unused
    camera_pos: vec4<f32>,
    fog_color: vec4<f32>,
    // fog_near, fog_far, exposure, clip_distance
    params: vec4<f32>,
    // rgb, hemisphere intensity
    sky_color: vec4<f32>,
    ground_color: vec4<f32>,
    // xyz, enabled
    spot_position: vec4<f32>,
    // xyz, cos(cone half-angle)
    spot_direction: vec4<f32>,
    // rgb, intensity
    spot_color: vec4<f32>,
    // sun colors, read by the sun pass only
    sun_top: vec4<f32>,
    sun_bottom: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct InstanceInput {
    @location(3) model_0: vec4<f32>,
    @location(4) model_1: vec4<f32>,
    @location(5) model_2: vec4<f32>,
    @location(6) model_3: vec4<f32>,
    @location(7) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) color: vec4<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let world_pos = model * vec4<f32>(vertex.position, 1.0);

    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * world_pos;
    out.world_pos = world_pos.xyz;
    out.world_normal = normalize((model * vec4<f32>(vertex.normal, 0.0)).xyz);
    out.color = instance.color;
    return out;
}

fn irradiance(n: vec3<f32>, p: vec3<f32>) -> vec3<f32> {
    let up = 0.5 * n.y + 0.5;
    var light = mix(uniforms.ground_color.rgb, uniforms.sky_color.rgb, up) * uniforms.sky_color.w;
    if (uniforms.spot_position.w > 0.5) {
        let l = normalize(uniforms.spot_position.xyz - p);
        let cos_angle = dot(-l, normalize(uniforms.spot_direction.xyz));
        let cone = smoothstep(uniforms.spot_direction.w, uniforms.spot_direction.w + 0.05, cos_angle);
        light += uniforms.spot_color.rgb * uniforms.spot_color.w * max(dot(n, l), 0.0) * cone;
    }
    return light;
}

fn reinhard(color: vec3<f32>) -> vec3<f32> {
    let c = color * uniforms.params.z;
    return c / (vec3<f32>(1.0) + c);
}

fn apply_fog(color: vec3<f32>, p: vec3<f32>) -> vec3<f32> {
    let range = distance(p, uniforms.camera_pos.xyz);
    let factor = smoothstep(uniforms.params.x, uniforms.params.y, range);
    return mix(color, uniforms.fog_color.rgb, factor);
}

@fragment
fn fs_terrain(in: VertexOutput) -> @location(0) vec4<f32> {
    if (in.world_pos.z < -uniforms.params.w) {
        discard;
    }
    let lit = in.color.rgb * irradiance(in.world_normal, in.world_pos);
    return vec4<f32>(apply_fog(reinhard(lit), in.world_pos), 1.0);
}

@fragment
fn fs_car(in: VertexOutput) -> @location(0) vec4<f32> {
    let lit = in.color.rgb * irradiance(in.world_normal, in.world_pos);
    return vec4<f32>(apply_fog(reinhard(lit), in.world_pos), 1.0);
}
"#;

/// WGSL shader for the sun half-disc. Not fogged.
///
/// `sun_top.w > 0.5` selects the texture; otherwise a banded gradient from
/// `sun_bottom` to `sun_top` is drawn with gaps cut into its lower half.
pub const SUN_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
    fog_color: vec4<f32>,
    params: vec4<f32>,
    sky_color: vec4<f32>,
    ground_color: vec4<f32>,
    spot_position: vec4<f32>,
    spot_direction: vec4<f32>,
    spot_color: vec4<f32>,
    sun_top: vec4<f32>,
    sun_bottom: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

@group(1) @binding(0)
var sun_texture: texture_2d<f32>;
@group(1) @binding(1)
var sun_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct InstanceInput {
    @location(3) model_0: vec4<f32>,
    @location(4) model_1: vec4<f32>,
    @location(5) model_2: vec4<f32>,
    @location(6) model_3: vec4<f32>,
    @location(7) color: vec4<f32>,
};

struct SunOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_sun(vertex: VertexInput, instance: InstanceInput) -> SunOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    var out: SunOutput;
    out.clip_position = uniforms.view_proj * model * vec4<f32>(vertex.position, 1.0);
    out.uv = vertex.uv;
    return out;
}

fn reinhard(color: vec3<f32>) -> vec3<f32> {
    let c = color * uniforms.params.z;
    return c / (vec3<f32>(1.0) + c);
}

@fragment
fn fs_sun(in: SunOutput) -> @location(0) vec4<f32> {
    // Texture is sampled unconditionally to keep control flow uniform.
    let texel = textureSample(sun_texture, sun_sampler, vec2<f32>(in.uv.x, 1.0 - in.uv.y));
    var color: vec3<f32>;
    if (uniforms.sun_top.w > 0.5) {
        color = texel.rgb;
    } else {
        // 0 at the horizon, 1 at the top of the half disc.
        let t = clamp(in.uv.y * 2.0 - 1.0, 0.0, 1.0);
        let band = fract(t * 10.0);
        if (t < 0.5 && band < (0.5 - t) * 0.8) {
            discard;
        }
        color = mix(uniforms.sun_bottom.rgb, uniforms.sun_top.rgb, t);
    }
    return vec4<f32>(reinhard(color), 1.0);
}
"#;
