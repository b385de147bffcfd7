use crate::{mesh_spec, provider};
use prometheus_client::{
    collector::Collector,
    encoding::{DescriptorEncoder, EncodeMetric},
    metrics::{gauge::ConstGauge, MetricType},
    registry::Registry,
};

#[derive(Debug)]
struct Instrumented {
    mesh_spec: mesh_spec::SharedIndex,
    provider: provider::SharedIndex,
}

pub fn register(
    reg: &mut Registry,
    mesh_spec: mesh_spec::SharedIndex,
    provider: provider::SharedIndex,
) {
    reg.register_collector(Box::new(Instrumented {
        mesh_spec,
        provider,
    }));
}

impl Collector for Instrumented {
    fn encode(&self, mut encoder: DescriptorEncoder<'_>) -> Result<(), std::fmt::Error> {
        let sizes = self.mesh_spec.read().sizes();
        let mut mesh_spec_encoder = encoder.encode_descriptor(
            "mesh_spec_index_size",
            "The number of policy resources in the mesh spec index",
            None,
            MetricType::Gauge,
        )?;
        for (kind, size) in [
            ("httproutegroup", sizes.route_groups),
            ("traffictarget", sizes.traffic_targets),
            ("trafficsplit", sizes.traffic_splits),
            ("ingressbackend", sizes.ingress_backends),
        ] {
            let labels = vec![("kind", kind)];
            let gauge = ConstGauge::new(size as u32);
            gauge.encode(mesh_spec_encoder.encode_family(&labels)?)?;
        }

        let (services, pods) = {
            let provider = self.provider.read();
            (provider.services_len(), provider.pods_len())
        };

        let service_encoder = encoder.encode_descriptor(
            "provider_service_index_size",
            "The number of services in the provider index",
            None,
            MetricType::Gauge,
        )?;
        ConstGauge::new(services as u32).encode(service_encoder)?;

        let pod_encoder = encoder.encode_descriptor(
            "provider_pod_index_size",
            "The number of pods in the provider index",
            None,
            MetricType::Gauge,
        )?;
        ConstGauge::new(pods as u32).encode(pod_encoder)?;

        Ok(())
    }
}
