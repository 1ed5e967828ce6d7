//! The scene contract: fixed declarations every generated fragment shares
//! with the renderer.
//!
//! Binding indices `0..MATERIAL_SAMPLER_BASE` belong to this contract.
//! Per-material samplers are assigned upward from
//! [`MATERIAL_SAMPLER_BASE`], one per texture property in graph node
//! order, and the device must bind textures at the indices recorded in
//! the generated binding map.

use crate::options::{RenderOptions, ShadowFilter};

/// Scene capacities handed to pipelines as specialization constants.
/// The generated source declares matching `constant_id` defaults.
pub const MAX_MATERIALS: i32 = 25;
pub const MAX_LIGHTS: i32 = 25;
pub const MAX_SPOT_LIGHTS: i32 = 4;
pub const MAX_PROBES: i32 = 4;

/// First binding index available to per-material samplers; everything
/// below is reserved for the scene contract.
pub const MATERIAL_SAMPLER_BASE: u32 = 10;

const SCENE_STRUCTS: &str = "\
layout (constant_id = 0) const int max_materials = 25;
layout (constant_id = 1) const int max_lights = 25;
layout (constant_id = 2) const int max_spot_lights = 4;
layout (constant_id = 3) const int max_probes = 4;
struct Material {
    vec4 color, info;
};
struct Light {
    vec4 positionType;
    vec4 directionPower;
    vec4 colorSize;
    vec4 shadowsEnable;
};
struct Probe {
    vec4 position, size;
};
layout(std430, binding = 1) buffer readonly SceneInformation {
    vec4 options;
    vec4 camPos;
    mat4 vp, lightSpace;
    mat4 spotLightSpaces[max_spot_lights];
    Material materials[max_materials];
    Light lights[max_lights];
    Probe probes[max_probes];
    int numLights;
} scene;
layout (binding = 2) uniform sampler2D sun_shadow;
layout (binding = 6) uniform sampler2DArray spot_shadow;
layout(push_constant, binding = 0) uniform PushConstant {
    mat4 model;
};
";

const IBL_SAMPLERS: &str = "\
layout (binding = 7) uniform samplerCubeArray irradianceSampler;
layout (binding = 8) uniform samplerCubeArray prefilterSampler;
layout (binding = 9) uniform sampler2D brdfSampler;
";

const PROBE_REFLECT_HELPER: &str = "\
vec3 get_reflect(int i, vec3 final_normal) {
    const vec3 direction = normalize(in_frag_pos - scene.camPos.xyz);
    const vec3 reflection = reflect(direction, normalize(final_normal));
    vec3 box_max = scene.probes[i].position.xyz + (scene.probes[i].size.xyz / 2.0);
    vec3 box_min = scene.probes[i].position.xyz + -(scene.probes[i].size.xyz / 2.0);
    vec3 first_plane_intersect = (box_max - in_frag_pos) / reflection;
    vec3 second_plane_intersect = (box_min - in_frag_pos) / reflection;
    vec3 furthest_plane = max(first_plane_intersect, second_plane_intersect);
    float distance = min(furthest_plane.x, min(furthest_plane.y, furthest_plane.z));
    vec3 intersect_position_world = in_frag_pos + reflection * distance;
    return intersect_position_world - scene.probes[i].position.xyz;
}
";

const NORMAL_LIGHTING_HELPER: &str = "\
float calculate_normal_lighting(in sampler2D normal_map, const vec3 normal, const vec3 light_dir) {
    float height_scale = 0.8;
    float sample_count = 100.0;
    float inv_sample_count = 1.0 / sample_count;
    float hardness = 50 * 0.5;
    float lighting = clamp(dot(light_dir, normal), 0.0, 1.0);
    float slope = -lighting;
    vec2 dir = light_dir.xy * vec2(1.0, -1.0) * height_scale;
    float max_slope = 0.0;
    float step = inv_sample_count;
    float pos = step;
    pos = (-lighting >= 0.0) ? 1.001 : pos;
    vec2 noise = fract(in_frag_pos.xy * 0.5);
    noise.x = noise.x + noise.y * 0.5;
    pos = step - step * noise.x;
    float shadow = 0.0;
    while(pos <= 1.0) {
        vec3 tmp_normal = texture(normal_map, in_uv + dir * pos).rgb;
        tmp_normal = in_tbn * (tmp_normal * 2.0 - 1.0);
        float tmp_lighting = dot(light_dir, tmp_normal);
        float shadowed = -tmp_lighting;
        slope += shadowed;
        if(slope > max_slope) {
            shadow += hardness * (1.0 - pos);
        }
        max_slope = max(max_slope, slope);
        pos += step;
    }
    return clamp(1.0 - shadow * inv_sample_count, 0.0, 1.0);
}
";

const IBL_HELPER: &str = "\
vec3 ibl(const int probe, const ComputedSurfaceInfo surface_info, const float intensity) {
    const vec3 F = fresnel_schlick_roughness(surface_info.NdotV, surface_info.F0, surface_info.roughness);
    const vec3 R = get_reflect(probe, surface_info.N);
    const vec2 brdf = texture(brdfSampler, vec2(surface_info.NdotV, surface_info.roughness)).rg;
    const vec3 sampledIrradiance = texture(irradianceSampler, vec4(surface_info.N, probe)).xyz;
    const vec3 prefilteredColor = textureLod(prefilterSampler, vec4(R, probe), surface_info.roughness * 4).xyz;
    const vec3 diffuse = sampledIrradiance * surface_info.diffuse_color;
    const vec3 specular = prefilteredColor * (F * brdf.x + brdf.y);
    return (diffuse + specular) * intensity;
}
";

const LIGHT_LOOP_HEAD: &str = "\
ComputedSurfaceInfo surface_info = compute_surface(final_diffuse_color.rgb, final_normal, final_metallic, final_roughness);
vec3 Lo = vec3(0);
for(int i = 0; i < scene.numLights; i++) {
    const int type = int(scene.lights[i].positionType.w);
    ComputedLightInformation light_info;
    switch(type) {
        case 0:
            light_info = calculate_point(scene.lights[i]);
            break;
        case 1:
            light_info = calculate_spot(scene.lights[i]);
            break;
        case 2:
            light_info = calculate_sun(scene.lights[i]);
            break;
    }
    SurfaceBRDF surface_brdf = brdf(light_info.direction, surface_info);
";

const LIGHT_LOOP_TAIL: &str = "\
    Lo += ((surface_brdf.specular + surface_brdf.diffuse) * light_info.radiance * surface_brdf.NdotL) * scene.lights[i].colorSize.rgb;
}
";

const IBL_AMBIENT: &str = "\
vec3 ambient = vec3(0.0);
float sum = 0.0;
for(int i = 0; i < max_probes; i++) {
    if(scene.probes[i].position.w == 1) {
        const vec3 position = scene.probes[i].position.xyz;
        const vec3 probe_min = position - (scene.probes[i].size.xyz / 2.0);
        const vec3 probe_max = position + (scene.probes[i].size.xyz / 2.0);
        if(all(greaterThan(in_frag_pos, probe_min)) && all(lessThan(in_frag_pos, probe_max))) {
            float intensity = 1.0 - length(abs(in_frag_pos - position) / (scene.probes[i].size.xyz / 2.0));
            intensity = clamp(intensity, 0.0, 1.0) * scene.probes[i].size.w;
            ambient += ibl(i, surface_info, intensity);
            sum += intensity;
        }
    } else if(scene.probes[i].position.w == 2) {
        ambient += ibl(i, surface_info, scene.probes[i].size.w);
        sum += scene.probes[i].size.w;
    }
}
ambient /= sum;
frag_output = vec4(ambient + Lo, 1.0);
";

pub(crate) fn shadow_filter_define(filter: ShadowFilter) -> &'static str {
    match filter {
        ShadowFilter::None => "#define SHADOW_FILTER_NONE\n",
        ShadowFilter::Pcf => "#define SHADOW_FILTER_PCF\n",
        ShadowFilter::Pcss => "#define SHADOW_FILTER_PCSS\n",
    }
}

/// Everything that precedes the per-material sampler declarations:
/// feature defines, varyings, the scene buffer and the shared includes.
pub(crate) fn write_prologue(src: &mut String, options: &RenderOptions, use_ibl: bool) {
    src.push_str(shadow_filter_define(options.shadow_filter));

    src.push_str("layout (location = 0) in vec3 in_frag_pos;\n");
    src.push_str("layout(location = 1) in vec3 in_normal;\n");
    src.push_str("layout(location = 2) in vec2 in_uv;\n");
    src.push_str("layout(location = 0) out vec4 frag_output;\n");

    if options.enable_point_shadows {
        src.push_str("#define POINT_SHADOWS_SUPPORTED\n");
        src.push_str("layout (binding = 3) uniform samplerCubeArray point_shadow;\n");
    }

    src.push_str(SCENE_STRUCTS);

    if use_ibl {
        src.push_str(IBL_SAMPLERS);
    }

    src.push_str("layout(location = 4) in vec4 fragPosLightSpace;\n");
    src.push_str("layout(location = 5) in mat3 in_tbn;\n");
    src.push_str("layout(location = 14) in vec4 fragPosSpotLightSpace[max_spot_lights];\n");

    src.push_str("#include \"common.glsl\"\n");
    src.push_str("#include \"rendering.glsl\"\n");
}

/// Helper functions emitted between the sampler declarations and `main`.
pub(crate) fn write_helpers(src: &mut String, options: &RenderOptions, use_ibl: bool) {
    if use_ibl {
        src.push_str(PROBE_REFLECT_HELPER);
    }
    if options.enable_normal_shadowing {
        src.push_str(NORMAL_LIGHTING_HELPER);
    }
    if use_ibl {
        src.push_str(IBL_HELPER);
    }
}

/// The lighting loop and final color store that close `main`.
///
/// `normal_map_sampler` is the sampler variable of the texture feeding the
/// output's normal input, when one exists; with normal shadowing enabled
/// it modulates each light's radiance.
pub(crate) fn write_epilogue(
    src: &mut String,
    options: &RenderOptions,
    use_ibl: bool,
    normal_map_sampler: Option<&str>,
) {
    src.push_str(LIGHT_LOOP_HEAD);

    if options.enable_normal_mapping && options.enable_normal_shadowing {
        if let Some(sampler) = normal_map_sampler {
            src.push_str(&format!(
                "    light_info.radiance *= calculate_normal_lighting({sampler}, final_normal, light_info.direction);\n"
            ));
        }
    }

    src.push_str(LIGHT_LOOP_TAIL);

    if use_ibl {
        src.push_str(IBL_AMBIENT);
    } else {
        src.push_str("frag_output = vec4(Lo, 1.0);\n");
    }

    src.push_str("}\n");
}
